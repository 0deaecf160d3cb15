use std::cmp::Ordering;

use quorum_models::{Direction, TieBreak};
use rust_decimal::Decimal;

use crate::schema::AgentOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSignalReason {
    /// No directional agent voted BUY.
    NoVotes,
    /// Both sides summed to the same score.
    Tie { score: Decimal },
}

/// Result of the directional vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vote<'a> {
    Signal {
        direction: Direction,
        /// The winning side's voters, in submission order.
        supporters: Vec<&'a AgentOutput>,
    },
    NoSignal(NoSignalReason),
}

/// Tally directional BUY votes by summed confidence per side.
///
/// Only directional outputs with action BUY vote. A side with no votes does
/// not compete, so a one-sided vote always wins.
pub fn tally_votes<'a, I>(outputs: I, tie_break: TieBreak) -> Vote<'a>
where
    I: IntoIterator<Item = &'a AgentOutput>,
{
    let mut yes: Vec<&AgentOutput> = Vec::new();
    let mut no: Vec<&AgentOutput> = Vec::new();
    let mut first_vote = None;

    for output in outputs {
        let Some(direction) = output.buy_vote() else {
            continue;
        };
        first_vote.get_or_insert(direction);
        match direction {
            Direction::Yes => yes.push(output),
            Direction::No => no.push(output),
        }
    }

    let direction = match (yes.is_empty(), no.is_empty()) {
        (true, true) => return Vote::NoSignal(NoSignalReason::NoVotes),
        (false, true) => Direction::Yes,
        (true, false) => Direction::No,
        (false, false) => {
            let yes_score: Decimal = yes.iter().map(|o| o.confidence()).sum();
            let no_score: Decimal = no.iter().map(|o| o.confidence()).sum();
            match yes_score.cmp(&no_score) {
                Ordering::Greater => Direction::Yes,
                Ordering::Less => Direction::No,
                Ordering::Equal => match (tie_break, first_vote) {
                    (TieBreak::FirstSubmitted, Some(first)) => first,
                    _ => return Vote::NoSignal(NoSignalReason::Tie { score: yes_score }),
                },
            }
        }
    };

    let supporters = match direction {
        Direction::Yes => yes,
        Direction::No => no,
    };

    Vote::Signal {
        direction,
        supporters,
    }
}
