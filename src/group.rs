//! Customer grouping for the grouped view.
//!
//! Groups are built from the raw dataset rather than the completeness-filtered
//! one, so a customer with some incomplete rows still shows their complete
//! ones. Host replies (edit links under `/hosting/reviews/`) are removed from
//! each customer's displayed list, and the displayed count follows.

use indexmap::IndexMap;

use crate::models::Record;

/// Key used for records without a customer name. Never displayed.
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

/// Grouping key: the customer's name, or [`UNKNOWN_CUSTOMER`].
pub fn customer_key(record: &Record) -> String {
    match record.customer_name.as_ref() {
        Some(name) if name.is_truthy() => name.to_string(),
        _ => UNKNOWN_CUSTOMER.to_string(),
    }
}

/// Partition records by customer, groups in first-seen order and records in
/// input order.
pub fn group_by_customer<'a, I>(records: I) -> IndexMap<String, Vec<&'a Record>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups: IndexMap<String, Vec<&Record>> = IndexMap::new();
    for record in records {
        groups.entry(customer_key(record)).or_default().push(record);
    }
    groups
}

/// True for the customer's own review; false for the host's edit link to
/// their reply, which must not be listed under the customer.
pub fn is_own_authored_review(record: &Record) -> bool {
    let link = record.text("review_link").to_lowercase();
    !(link.contains("/hosting/reviews/") && link.contains("/edit"))
}

/// A customer's displayed reviews.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerGroup<'a> {
    pub customer: String,
    pub reviews: Vec<&'a Record>,
}

impl CustomerGroup<'_> {
    /// Count shown next to the customer, after host replies are removed.
    pub fn count(&self) -> usize {
        self.reviews.len()
    }
}

/// Groups as shown in the grouped view: `"Unknown"` dropped, host replies
/// removed from every group.
pub fn displayed_groups<'a, I>(records: I) -> Vec<CustomerGroup<'a>>
where
    I: IntoIterator<Item = &'a Record>,
{
    group_by_customer(records)
        .into_iter()
        .filter(|(customer, _)| customer != UNKNOWN_CUSTOMER)
        .map(|(customer, reviews)| CustomerGroup {
            customer,
            reviews: reviews
                .into_iter()
                .filter(|r| is_own_authored_review(r))
                .collect(),
        })
        .collect()
}
