use fixdesk_auth::{Identity, authorize};
use fixdesk_core::{ComplaintStatus, Result, Role};
use fixdesk_db::{ComplaintFilter, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
	pub category: String,
	pub count: u64,
}

/// Aggregate view over every complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
	pub total: u64,
	pub pending: u64,
	pub in_progress: u64,
	pub resolved: u64,
	/// Sorted by category name.
	pub per_category_counts: Vec<CategoryCount>,
	/// Mean of `updatedAt - createdAt` over resolved complaints; 0 when none.
	pub avg_resolution_millis: f64,
}

/// Builds [`Report`]s for admins.
pub struct ReportAggregator {
	store: Arc<dyn Store>,
}

impl ReportAggregator {
	pub fn new(store: Arc<dyn Store>) -> Self {
		Self { store }
	}

	pub async fn build_report(&self, identity: &Identity) -> Result<Report> {
		authorize(identity, &[Role::Admin])?;

		let count = |status| {
			let filter = ComplaintFilter::all().with_status(status);
			let store = Arc::clone(&self.store);
			async move { store.count_complaints(&filter).await }
		};

		let total = self.store.count_complaints(&ComplaintFilter::all()).await?;
		let pending = count(ComplaintStatus::Pending).await?;
		let in_progress = count(ComplaintStatus::InProgress).await?;
		let resolved = count(ComplaintStatus::Resolved).await?;

		let per_category_counts = self
			.store
			.count_by_category()
			.await?
			.into_iter()
			.map(|(category, count)| CategoryCount { category, count })
			.collect();

		let durations: Vec<i64> = self
			.store
			.list_complaints(&ComplaintFilter::all().with_status(ComplaintStatus::Resolved))
			.await?
			.iter()
			.filter_map(|c| c.resolution_millis())
			.collect();
		let avg_resolution_millis = if durations.is_empty() {
			0.0
		} else {
			durations.iter().map(|&ms| ms as f64).sum::<f64>() / durations.len() as f64
		};

		Ok(Report {
			total,
			pending,
			in_progress,
			resolved,
			per_category_counts,
			avg_resolution_millis,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use fixdesk_core::{Complaint, Error};
	use fixdesk_db::MemoryStore;
	use rstest::rstest;
	use uuid::Uuid;

	fn admin() -> Identity {
		Identity::new(Uuid::new_v4(), Role::Admin)
	}

	async fn seeded(statuses: &[(&str, ComplaintStatus, Option<i64>)]) -> ReportAggregator {
		let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
		let owner = Uuid::new_v4();
		for (category, status, resolved_after) in statuses {
			let mut complaint = Complaint::new(owner, *category, "t", "", None);
			complaint.status = *status;
			complaint.updated_at =
				resolved_after.map(|ms| complaint.created_at + Duration::milliseconds(ms));
			store.insert_complaint(complaint).await.unwrap();
		}
		ReportAggregator::new(store)
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_report() {
		let report = seeded(&[]).await.build_report(&admin()).await.unwrap();

		assert_eq!(report.total, 0);
		assert!(report.per_category_counts.is_empty());
		assert_eq!(report.avg_resolution_millis, 0.0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_counts_partition_total() {
		let aggregator = seeded(&[
			("Plumbing", ComplaintStatus::Pending, None),
			("Plumbing", ComplaintStatus::InProgress, Some(10)),
			("Electrical", ComplaintStatus::Resolved, Some(1_000)),
			("Electrical", ComplaintStatus::Resolved, Some(3_000)),
			("HVAC", ComplaintStatus::Pending, None),
		])
		.await;

		let report = aggregator.build_report(&admin()).await.unwrap();

		assert_eq!(report.total, 5);
		assert_eq!(report.pending + report.in_progress + report.resolved, report.total);
		assert_eq!((report.pending, report.in_progress, report.resolved), (2, 1, 2));
		assert_eq!(report.avg_resolution_millis, 2_000.0);
		let categories: Vec<_> = report
			.per_category_counts
			.iter()
			.map(|c| (c.category.as_str(), c.count))
			.collect();
		assert_eq!(categories, vec![("Electrical", 2), ("HVAC", 1), ("Plumbing", 2)]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_report_is_admin_only() {
		let aggregator = seeded(&[]).await;
		let tech = Identity::new(Uuid::new_v4(), Role::Technician);

		let result = aggregator.build_report(&tech).await;

		assert!(matches!(result, Err(Error::Authorization(_))));
	}

	#[rstest]
	fn test_report_wire_names() {
		let report = Report {
			total: 1,
			pending: 0,
			in_progress: 1,
			resolved: 0,
			per_category_counts: vec![CategoryCount {
				category: "HVAC".into(),
				count: 1,
			}],
			avg_resolution_millis: 0.0,
		};

		let json = serde_json::to_value(&report).unwrap();

		assert_eq!(json["inProgress"], 1);
		assert_eq!(json["perCategoryCounts"][0]["category"], "HVAC");
		assert_eq!(json["avgResolutionMillis"], 0.0);
		let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
		keys.sort();
		assert_eq!(
			keys,
			[
				"avgResolutionMillis",
				"inProgress",
				"pending",
				"perCategoryCounts",
				"resolved",
				"total"
			]
		);
	}
}
