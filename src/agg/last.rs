#[derive(Clone)]
pub struct Last;

impl super::Aggregation for Last {
    fn transform(_: f64, x: f64) -> f64 {
        x
    }
}
