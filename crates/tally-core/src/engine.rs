//! The counting rule engine.
//!
//! [`evaluate`] runs four guards in a fixed priority order and stops at the
//! first one that fails:
//!
//! 1. one-by-one: the same member may not count twice in a row
//! 2. talking: extra text after the number, when talking is off
//! 3. format: the leading token is not a number
//! 4. value: the number is not `count + 1`
//!
//! The outcome is a [`Verdict`] plus the [`Mutation`]s and [`Effect`]s that
//! realise it. No I/O happens here.

use crate::effect::{Effect, Notice, Reaction};
use crate::event::IncomingMessage;
use crate::parse::{CountToken, leading_count, tokenize};
use crate::state::{ChannelState, Mutation};
use crate::MILESTONE_INTERVAL;
use std::fmt;

/// Which rule a rejected post broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Same member counted twice in a row.
    OneByOne,
    /// Extra text while talking is disabled.
    Talking,
    /// Leading token is not a number.
    Format,
    /// Well-formed number, wrong value.
    WrongValue {
        /// The value that would have been accepted, `None` when the count
        /// can no longer advance.
        expected: Option<i64>,
        /// The value that was posted, `None` when it does not fit an `i64`.
        got: Option<i64>,
    },
}

impl Violation {
    /// Static label for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OneByOne => "one_by_one",
            Self::Talking => "talking",
            Self::Format => "format",
            Self::WrongValue { .. } => "wrong_value",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A rejected post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    /// The broken rule.
    pub violation: Violation,
    /// Whether the count was reset to zero.
    pub reset: bool,
}

/// Outcome of evaluating one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The post advanced the count to `value`.
    Accepted {
        /// The new count.
        value: i64,
    },
    /// The post was rejected.
    Rejected(Rejection),
}

impl Verdict {
    /// Whether the post was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Static label for metrics: `accepted` or the violation code.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Rejected(r) => r.violation.code(),
        }
    }
}

/// Everything [`evaluate`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// State after applying [`Evaluation::mutations`].
    pub state: ChannelState,
    /// Accept or reject.
    pub verdict: Verdict,
    /// Changes to persist, in order, as one batch.
    pub mutations: Vec<Mutation>,
    /// Gateway instructions, in order.
    pub effects: Vec<Effect>,
}

/// Evaluate `message` against `state`.
///
/// The caller guarantees the message was posted in the counting channel by
/// a human member.
pub fn evaluate(state: &ChannelState, message: &IncomingMessage) -> Evaluation {
    let settings = &state.settings;

    let outcome = if settings.one_by_one
        && state.previous_poster_id.as_deref() == Some(message.author_id.as_str())
    {
        Err(Violation::OneByOne)
    } else if !settings.talking && tokenize(&message.content).len() > 1 {
        Err(Violation::Talking)
    } else {
        let expected = state.next_count();
        match leading_count(&message.content) {
            CountToken::Malformed => Err(Violation::Format),
            CountToken::Value(n) if Some(n) == expected => Ok(n),
            CountToken::Value(n) => Err(Violation::WrongValue {
                expected,
                got: Some(n),
            }),
            CountToken::Overflow => Err(Violation::WrongValue {
                expected,
                got: None,
            }),
        }
    };

    match outcome {
        Ok(value) => accept(state, message, value),
        Err(violation) => reject(state, message, violation),
    }
}

fn accept(state: &ChannelState, message: &IncomingMessage, value: i64) -> Evaluation {
    let mutations = vec![
        Mutation::SetCount(value),
        Mutation::SetPreviousPoster(Some(message.author_id.clone())),
        Mutation::SetPreviousMessage(Some(message.id.clone())),
        Mutation::IncrementCounts(message.author_id.clone()),
    ];

    let mut effects = Vec::new();
    if state.settings.reset_on_fail {
        effects.push(Effect::React {
            message_id: message.id.clone(),
            reaction: Reaction::Success,
        });
    }
    if state.settings.pin_milestones && value % MILESTONE_INTERVAL == 0 {
        effects.push(Effect::PinMilestone {
            message_id: message.id.clone(),
        });
    }

    finish(state, Verdict::Accepted { value }, mutations, effects)
}

fn reject(state: &ChannelState, message: &IncomingMessage, violation: Violation) -> Evaluation {
    let reset = state.settings.reset_on_fail;
    let mut mutations = Vec::with_capacity(2);
    let mut effects = Vec::with_capacity(2);

    if reset {
        mutations.push(Mutation::ResetCount);
        if matches!(violation, Violation::WrongValue { .. }) {
            effects.push(Effect::React {
                message_id: message.id.clone(),
                reaction: Reaction::Failure,
            });
        }
        effects.push(Effect::Announce(Notice {
            member_id: message.author_id.clone(),
            violation,
        }));
    } else {
        effects.push(Effect::Delete {
            message_id: message.id.clone(),
        });
    }
    mutations.push(Mutation::IncrementFails(message.author_id.clone()));

    finish(
        state,
        Verdict::Rejected(Rejection { violation, reset }),
        mutations,
        effects,
    )
}

fn finish(
    state: &ChannelState,
    verdict: Verdict,
    mutations: Vec<Mutation>,
    effects: Vec<Effect>,
) -> Evaluation {
    let mut next = state.clone();
    next.apply_all(&mutations);
    Evaluation {
        state: next,
        verdict,
        mutations,
        effects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MemberRecord;

    fn msg(id: &str, author: &str, content: &str) -> IncomingMessage {
        IncomingMessage::new(id, author, content)
    }

    fn at(count: i64) -> ChannelState {
        let mut state = ChannelState::enabled("chan");
        state.count = count;
        state
    }

    #[test]
    fn accepts_next_number() {
        let eval = evaluate(&at(0), &msg("m1", "alice", "1"));
        assert_eq!(eval.verdict, Verdict::Accepted { value: 1 });
        assert_eq!(eval.state.count, 1);
        assert_eq!(eval.state.previous_poster_id.as_deref(), Some("alice"));
        assert_eq!(eval.state.previous_message_id.as_deref(), Some("m1"));
        assert_eq!(eval.state.member("alice"), MemberRecord::new(1, 0));
        assert!(eval.effects.is_empty());
    }

    #[test]
    fn one_by_one_rejects_second_post_regardless_of_value() {
        let mut state = at(41);
        state.settings.one_by_one = true;

        let first = evaluate(&state, &msg("m42", "alice", "42"));
        assert_eq!(first.verdict, Verdict::Accepted { value: 42 });

        let second = evaluate(&first.state, &msg("m43", "alice", "43"));
        assert_eq!(
            second.verdict,
            Verdict::Rejected(Rejection {
                violation: Violation::OneByOne,
                reset: false
            })
        );
        assert_eq!(second.state.count, 42);
        assert_eq!(second.state.member("alice"), MemberRecord::new(1, 1));
        assert_eq!(
            second.effects,
            vec![Effect::Delete {
                message_id: "m43".into()
            }]
        );
    }

    #[test]
    fn talking_violation_wins_over_value_check() {
        let mut state = at(4);
        state.settings.talking = false;

        let eval = evaluate(&state, &msg("m5", "bob", "5 nice"));
        assert_eq!(eval.verdict.outcome(), "talking");
        assert_eq!(eval.state.count, 4);
        assert_eq!(eval.state.member("bob").fails, 1);
        assert_eq!(
            eval.effects,
            vec![Effect::Delete {
                message_id: "m5".into()
            }]
        );
    }

    #[test]
    fn talking_allowed_by_default() {
        let eval = evaluate(&at(4), &msg("m5", "bob", "5 nice"));
        assert!(eval.verdict.is_accepted());
    }

    #[test]
    fn format_violation_for_non_numbers() {
        for content in ["five", "", "-5", "5five", "#5"] {
            let eval = evaluate(&at(4), &msg("m", "bob", content));
            assert_eq!(eval.verdict.outcome(), "format", "content {:?}", content);
        }
    }

    #[test]
    fn thousands_separators_are_accepted() {
        let eval = evaluate(&at(999), &msg("m", "bob", "1,000"));
        assert_eq!(eval.verdict, Verdict::Accepted { value: 1000 });
    }

    #[test]
    fn wrong_value_is_deleted_without_reset() {
        let eval = evaluate(&at(10), &msg("m", "bob", "12"));
        assert_eq!(
            eval.verdict,
            Verdict::Rejected(Rejection {
                violation: Violation::WrongValue {
                    expected: Some(11),
                    got: Some(12)
                },
                reset: false
            })
        );
        assert_eq!(eval.state.count, 10);
        assert_eq!(eval.mutations, vec![Mutation::IncrementFails("bob".into())]);
    }

    #[test]
    fn oversized_number_is_a_wrong_value() {
        let eval = evaluate(&at(10), &msg("m", "bob", "123456789012345678901234567890"));
        assert_eq!(
            eval.verdict,
            Verdict::Rejected(Rejection {
                violation: Violation::WrongValue {
                    expected: Some(11),
                    got: None
                },
                reset: false
            })
        );
    }

    #[test]
    fn reset_on_fail_resets_for_every_violation() {
        let cases = [
            ("alice", "8", Violation::OneByOne),
            ("bob", "8 hi", Violation::Talking),
            ("bob", "eight", Violation::Format),
        ];
        for (author, content, violation) in cases {
            let mut state = at(7);
            state.previous_poster_id = Some("alice".into());
            state.settings.one_by_one = true;
            state.settings.talking = false;
            state.settings.reset_on_fail = true;
            state.members.insert(author.into(), MemberRecord::new(5, 2));

            let eval = evaluate(&state, &msg("m", author, content));
            assert_eq!(
                eval.verdict,
                Verdict::Rejected(Rejection {
                    violation,
                    reset: true
                })
            );
            assert_eq!(eval.state.count, 0);
            assert_eq!(eval.state.member(author), MemberRecord::new(5, 3));
            assert_eq!(
                eval.effects,
                vec![Effect::Announce(Notice {
                    member_id: author.into(),
                    violation
                })]
            );
        }
    }

    #[test]
    fn reset_on_fail_reacts_to_wrong_value() {
        let mut state = at(7);
        state.settings.reset_on_fail = true;
        let eval = evaluate(&state, &msg("m", "bob", "9"));
        assert_eq!(eval.state.count, 0);
        assert_eq!(
            eval.effects[0],
            Effect::React {
                message_id: "m".into(),
                reaction: Reaction::Failure
            }
        );
        assert!(matches!(eval.effects[1], Effect::Announce(_)));
    }

    #[test]
    fn reset_on_fail_reacts_to_accepted_counts() {
        let mut state = at(7);
        state.settings.reset_on_fail = true;
        let eval = evaluate(&state, &msg("m", "bob", "8"));
        assert_eq!(
            eval.effects,
            vec![Effect::React {
                message_id: "m".into(),
                reaction: Reaction::Success
            }]
        );
    }

    #[test]
    fn milestones_are_pinned_when_enabled() {
        let mut state = at(19);
        state.settings.pin_milestones = true;
        let eval = evaluate(&state, &msg("m20", "bob", "20"));
        assert_eq!(
            eval.effects,
            vec![Effect::PinMilestone {
                message_id: "m20".into()
            }]
        );

        let eval = evaluate(&eval.state, &msg("m21", "carol", "21"));
        assert!(eval.effects.is_empty());
    }

    #[test]
    fn count_equals_accepted_posts_despite_interleaved_rejections() {
        let mut state = at(0);
        let mut accepted = 0;
        for i in 0..200 {
            let author = format!("member{}", i % 3);
            let content = match i % 4 {
                0 => "oops".to_string(),
                1 => (state.count + 5).to_string(),
                _ => (state.count + 1).to_string(),
            };
            let eval = evaluate(&state, &msg(&format!("m{}", i), &author, &content));
            if eval.verdict.is_accepted() {
                accepted += 1;
            }
            state = eval.state;
        }
        assert_eq!(state.count, accepted);
        let totals: u64 = state.members.values().map(|m| m.counts).sum();
        assert_eq!(totals as i64, accepted);
    }

    #[test]
    fn replaying_an_accepted_message_never_double_counts() {
        let message = msg("m1", "alice", "1");
        let first = evaluate(&at(0), &message);
        let second = evaluate(&first.state, &message);
        assert_eq!(second.verdict.outcome(), "wrong_value");
        assert_eq!(second.state.member("alice"), MemberRecord::new(1, 1));
        assert_eq!(second.state.count, 1);
    }

    #[test]
    fn saturated_count_rejects_every_number() {
        let max = i64::MAX.to_string();
        let first = evaluate(&at(i64::MAX), &msg("m1", "alice", &max));
        assert_eq!(
            first.verdict,
            Verdict::Rejected(Rejection {
                violation: Violation::WrongValue {
                    expected: None,
                    got: Some(i64::MAX)
                },
                reset: false
            })
        );
        let second = evaluate(&first.state, &msg("m2", "bob", &max));
        assert!(!second.verdict.is_accepted());
        assert_eq!(second.state.count, i64::MAX);
        assert_eq!(second.state.member("alice"), MemberRecord::new(0, 1));
        assert_eq!(second.state.member("bob"), MemberRecord::new(0, 1));

        let overflow = evaluate(&at(i64::MAX), &msg("m3", "carol", "9223372036854775808"));
        assert_eq!(overflow.verdict.outcome(), "wrong_value");
    }

    #[test]
    fn last_representable_count_is_accepted() {
        let eval = evaluate(&at(i64::MAX - 1), &msg("m", "alice", &i64::MAX.to_string()));
        assert_eq!(eval.verdict, Verdict::Accepted { value: i64::MAX });
    }

    #[test]
    fn rejections_keep_previous_pointers() {
        let mut state = at(3);
        state.previous_poster_id = Some("alice".into());
        state.previous_message_id = Some("m3".into());
        let eval = evaluate(&state, &msg("m", "bob", "9"));
        assert_eq!(eval.state.previous_poster_id.as_deref(), Some("alice"));
        assert_eq!(eval.state.previous_message_id.as_deref(), Some("m3"));
    }
}
