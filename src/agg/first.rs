#[derive(Clone)]
pub struct First;

impl super::Aggregation for First {
    fn transform(accu: f64, _: f64) -> f64 {
        accu
    }
}
