#[derive(Clone)]
pub struct Sum;

impl super::Aggregation for Sum {}
