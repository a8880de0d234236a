#[derive(Clone)]
pub struct Min;

impl super::Aggregation for Min {
    fn transform(accu: f64, x: f64) -> f64 {
        accu.min(x)
    }
}
