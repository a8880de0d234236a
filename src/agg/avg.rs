use super::{Aggregation, Cell};

#[derive(Clone)]
pub struct Avg;

impl Aggregation for Avg {
    #[allow(clippy::cast_precision_loss)]
    fn finish(cell: &Cell) -> f64 {
        cell.accu / cell.len as f64
    }
}
