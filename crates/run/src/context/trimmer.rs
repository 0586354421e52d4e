//! Conversation window trimming.
//!
//! Selects a suffix of a message history that fits a token budget, with
//! the guarantee that a non-empty window always opens with a `user`
//! message (providers reject histories that lead with an assistant turn).
//!
//! # Determinism
//!
//! Trimming is deterministic: identical inputs always produce identical
//! windows, and the input slice is never mutated.

use colloquy_core::message::{Message, Role};

use super::token::{CounterKind, count_tokens};

/// The token cost of one message: the count over its concatenated
/// text-bearing content. Image blocks have a fixed out-of-band cost and
/// contribute zero here.
pub fn message_cost(message: &Message, counter: CounterKind) -> usize {
    message
        .content
        .iter()
        .filter_map(|block| block.budget_text())
        .map(|text| count_tokens(&text, counter))
        .sum()
}

/// Trim `messages` to a window that fits `max_tokens`.
///
/// # Algorithm
///
/// 1. Clone and sort ascending by creation time (stable; input untouched)
/// 2. Walk newest → oldest, accumulating messages while the running total
///    stays within budget; stop at the first message that would overflow
/// 3. Drop from the front of the kept window until it opens with a `user`
///    message; if none remains, the window is empty
///
/// Older messages dropped in step 2 are never re-included by step 3.
pub fn trim(messages: &[Message], max_tokens: usize, counter: CounterKind) -> Vec<Message> {
    let mut ordered: Vec<Message> = messages.to_vec();
    ordered.sort_by_key(|m| m.created_at);

    let mut kept: Vec<Message> = Vec::new();
    let mut total = 0usize;
    for message in ordered.into_iter().rev() {
        let cost = message_cost(&message, counter);
        if total + cost > max_tokens {
            break;
        }
        total += cost;
        kept.push(message);
    }
    kept.reverse();

    match kept.iter().position(|m| m.role == Role::User) {
        Some(0) => kept,
        Some(first_user) => kept.split_off(first_user),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use colloquy_core::message::MessageContent;
    use colloquy_core::thread::ThreadId;

    /// A message costing exactly `tokens` under the char heuristic,
    /// created `seq` seconds after a fixed base instant.
    fn msg(role: Role, tokens: usize, seq: i64) -> Message {
        let mut message = Message::new(
            ThreadId::from("t1"),
            role,
            vec![MessageContent::text("x".repeat(tokens * 4))],
        );
        message.created_at = Utc::now() + Duration::seconds(seq);
        message
    }

    fn heuristic() -> CounterKind {
        CounterKind::CharHeuristic
    }

    #[test]
    fn window_shrinks_forward_never_reincludes() {
        // user(30) assistant(30) user(30) assistant(30), budget 100:
        // the last three fit (90 tokens) but lead with an assistant, so
        // the window shrinks to the last two. The first user message is
        // already dropped and must not come back.
        let history = vec![
            msg(Role::User, 30, 0),
            msg(Role::Assistant, 30, 1),
            msg(Role::User, 30, 2),
            msg(Role::Assistant, 30, 3),
        ];

        let window = trim(&history, 100, heuristic());
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[0].id, history[2].id);
        assert_eq!(window[1].id, history[3].id);
    }

    #[test]
    fn single_oversized_message_yields_empty() {
        let history = vec![msg(Role::User, 200, 0)];
        assert!(trim(&history, 100, heuristic()).is_empty());
    }

    #[test]
    fn empty_history_yields_empty() {
        assert!(trim(&[], 100, heuristic()).is_empty());
    }

    #[test]
    fn everything_fits_keeps_everything() {
        let history = vec![
            msg(Role::User, 10, 0),
            msg(Role::Assistant, 10, 1),
            msg(Role::User, 10, 2),
        ];
        let window = trim(&history, 100, heuristic());
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].id, history[0].id);
    }

    #[test]
    fn no_user_message_in_window_yields_empty() {
        let history = vec![msg(Role::Assistant, 10, 0), msg(Role::Tool, 10, 1)];
        assert!(trim(&history, 100, heuristic()).is_empty());
    }

    #[test]
    fn input_is_not_mutated() {
        let history = vec![
            msg(Role::Assistant, 30, 1),
            msg(Role::User, 30, 0),
            msg(Role::Assistant, 30, 2),
        ];
        let ids_before: Vec<String> = history.iter().map(|m| m.id.clone()).collect();

        let _ = trim(&history, 50, heuristic());

        let ids_after: Vec<String> = history.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids_before, ids_after);
    }

    #[test]
    fn unsorted_input_is_ordered_by_creation_time() {
        // Delivered out of order; trimming must consider creation time.
        let newest = msg(Role::Assistant, 10, 2);
        let oldest = msg(Role::User, 10, 0);
        let middle = msg(Role::Assistant, 10, 1);
        let history = vec![newest.clone(), oldest.clone(), middle.clone()];

        let window = trim(&history, 100, heuristic());
        assert_eq!(window[0].id, oldest.id);
        assert_eq!(window[2].id, newest.id);
    }

    #[test]
    fn window_total_never_exceeds_budget() {
        let history: Vec<Message> = (0..10)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                msg(role, 25, i)
            })
            .collect();

        for budget in [0, 10, 40, 60, 120, 500] {
            let window = trim(&history, budget, heuristic());
            let total: usize = window
                .iter()
                .map(|m| message_cost(m, heuristic()))
                .sum();
            assert!(total <= budget, "budget {budget} exceeded: {total}");
        }
    }

    #[test]
    fn walk_stops_at_first_overflowing_message() {
        // newest(40) + next(40) fit in 100; the 30-token message behind
        // them overflows, so the walk stops even though a later (older)
        // message might have fit.
        let history = vec![
            msg(Role::User, 10, 0),
            msg(Role::User, 30, 1),
            msg(Role::User, 40, 2),
            msg(Role::User, 40, 3),
        ];
        let window = trim(&history, 100, heuristic());
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].id, history[2].id);
    }

    #[test]
    fn image_blocks_are_free() {
        let mut message = Message::new(
            ThreadId::from("t1"),
            Role::User,
            vec![
                MessageContent::Image {
                    index: 0,
                    content_type: "image/png".into(),
                },
                MessageContent::text("x".repeat(40)),
            ],
        );
        message.created_at = Utc::now();
        assert_eq!(message_cost(&message, heuristic()), 10);
    }

    #[test]
    fn tool_blocks_are_counted() {
        let message = Message::new(
            ThreadId::from("t1"),
            Role::Assistant,
            vec![MessageContent::tool_use(
                "call_1",
                "search",
                serde_json::json!({"q": "rust"}),
            )],
        );
        assert!(message_cost(&message, heuristic()) > 0);
    }
}
