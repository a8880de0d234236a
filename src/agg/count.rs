#[derive(Clone)]
pub struct Count;

impl super::Aggregation for Count {
    fn init(_: f64) -> f64 {
        1.0
    }

    fn transform(accu: f64, _: f64) -> f64 {
        accu + 1.0
    }
}
