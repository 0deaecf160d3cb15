use rust_decimal::Decimal;

use crate::schema::AgentOutput;

/// A recommendation is only as strong as its weakest supporter: the minimum
/// confidence of the winning side. `None` when there are no supporters.
pub fn combine_confidence<'a, I>(supporters: I) -> Option<Decimal>
where
    I: IntoIterator<Item = &'a AgentOutput>,
{
    supporters.into_iter().map(|o| o.confidence()).min()
}
