#[derive(Clone)]
pub struct Max;

impl super::Aggregation for Max {
    fn transform(accu: f64, x: f64) -> f64 {
        accu.max(x)
    }
}
