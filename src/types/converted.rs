/// USD value of one transaction, signed by its event kind.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertedRecord {
    pub project_id: String,
    pub date: String,
    pub usd_amount: f64,
}
