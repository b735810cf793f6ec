//! Tests for the conversation driver: turn-taking, input-required
//! follow-ups, empty replies, and disconnect handling.

mod common;

use a2a_chat::console::{Notice, FOLLOW_UP_PROMPT, QUERY_PROMPT};
use a2a_chat::conversation::{Conversation, ConversationState, TurnSummary};
use a2a_chat::error::A2AError;
use a2a_chat::types::{Correlation, TaskState};
use common::{agent_reply, task_update, FailingSender, ScriptedConsole, ScriptedSender, Shown};

fn disconnected() -> A2AError {
    A2AError::Disconnected("agent closed the stream before the exchange finished".to_string())
}

// ============================================================================
// interactive_loop
// ============================================================================

#[tokio::test]
async fn each_non_exit_line_submits_exactly_once() {
    let sender = ScriptedSender::new(vec![
        vec![Ok(agent_reply("one"))],
        vec![Ok(agent_reply("two"))],
        vec![Ok(agent_reply("three"))],
    ]);
    let console = ScriptedConsole::new(&["first", "second", "", "exit"]);
    let mut conversation = Conversation::new(sender, console);

    conversation.interactive_loop().await.unwrap();

    let texts: Vec<String> = conversation.sender().sent().iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["first", "second", ""]);
    assert_eq!(conversation.console().notices().last(), Some(&Notice::Goodbye));
}

#[tokio::test]
async fn exit_keywords_end_loop_without_submitting() {
    for keyword in ["exit", "EXIT", "quit", "Quit", "  exit  "] {
        let sender = ScriptedSender::default();
        let mut conversation = Conversation::new(sender, ScriptedConsole::new(&[keyword]));

        conversation.interactive_loop().await.unwrap();

        assert!(
            conversation.sender().sent().is_empty(),
            "{keyword:?} should not submit"
        );
        assert_eq!(
            conversation.console().notices(),
            vec![Notice::Instructions, Notice::Goodbye]
        );
    }
}

#[tokio::test]
async fn end_of_input_ends_loop() {
    let sender = ScriptedSender::new(vec![vec![Ok(agent_reply("hi"))]]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::new(&["hello"]));

    conversation.interactive_loop().await.unwrap();

    assert_eq!(conversation.sender().sent().len(), 1);
    assert_eq!(conversation.console().prompts(), vec![QUERY_PROMPT, QUERY_PROMPT]);
}

#[tokio::test]
async fn top_level_queries_never_carry_ids() {
    let sender = ScriptedSender::new(vec![
        vec![Ok(task_update("t1", "c1", TaskState::Completed))],
        vec![Ok(agent_reply("ok"))],
    ]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::new(&["a", "b", "quit"]));

    conversation.interactive_loop().await.unwrap();

    for message in conversation.sender().sent() {
        assert!(message.task_id.is_none());
        assert!(message.context_id.is_none());
    }
}

#[tokio::test]
async fn non_disconnect_error_leaves_loop() {
    let sender = FailingSender(A2AError::Http {
        status: 500,
        body: "boom".to_string(),
    });
    let mut conversation = Conversation::new(sender, ScriptedConsole::new(&["hello", "again"]));

    let err = conversation.interactive_loop().await.unwrap_err();

    assert!(matches!(err, A2AError::Http { status: 500, .. }));
    // The second line is never read.
    assert_eq!(conversation.console().prompts(), vec![QUERY_PROMPT]);
}

#[tokio::test]
async fn disconnect_keeps_loop_alive() {
    let sender = ScriptedSender::new(vec![
        vec![Err(disconnected())],
        vec![Ok(agent_reply("back again"))],
    ]);
    let mut conversation =
        Conversation::new(sender, ScriptedConsole::new(&["first", "second", "exit"]));

    conversation.interactive_loop().await.unwrap();

    assert_eq!(conversation.sender().sent().len(), 2);
    let notices = conversation.console().notices();
    assert!(notices.contains(&Notice::Disconnected));
    assert!(!notices.contains(&Notice::NoResponse));
    assert_eq!(conversation.console().titles(), vec!["Agent Reply"]);
}

#[tokio::test]
async fn disconnect_at_submission_is_a_warning() {
    let sender = FailingSender(disconnected());
    let mut conversation = Conversation::new(sender, ScriptedConsole::new(&["hi", "exit"]));

    conversation.interactive_loop().await.unwrap();

    assert!(conversation
        .console()
        .notices()
        .contains(&Notice::Disconnected));
}

// ============================================================================
// submit_and_drain
// ============================================================================

#[tokio::test]
async fn empty_response_reports_no_response() {
    let sender = ScriptedSender::new(vec![vec![]]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::default());

    let summary = conversation.submit_and_drain("anyone?", None).await.unwrap();

    assert_eq!(
        summary,
        TurnSummary {
            submissions: 1,
            items: 0,
            empty_submissions: 1,
            disconnects: 0,
        }
    );
    assert_eq!(conversation.console().notices(), vec![Notice::NoResponse]);
}

#[tokio::test]
async fn final_reply_is_rendered_without_follow_up() {
    let sender = ScriptedSender::new(vec![vec![Ok(agent_reply("It is noon."))]]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::default());

    let summary = conversation.submit_and_drain("What time is it?", None).await.unwrap();

    assert_eq!(summary.submissions, 1);
    assert_eq!(summary.items, 1);
    assert_eq!(conversation.sender().sent().len(), 1);
    assert!(conversation.console().prompts().is_empty());

    match &conversation.console().shown[0] {
        Shown::Render { title, payload } => {
            assert_eq!(title, "Agent Reply");
            assert_eq!(payload["parts"][0]["text"], "It is noon.");
            assert_eq!(payload["role"], "agent");
        }
        other => panic!("expected a render, got {other:?}"),
    }
    assert_eq!(conversation.state(), &ConversationState::Done);
}

#[tokio::test]
async fn streaming_update_renders_task_and_update() {
    let sender = ScriptedSender::new(vec![vec![
        Ok(task_update("t1", "c1", TaskState::Working)),
        Ok(task_update("t1", "c1", TaskState::Completed)),
    ]]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::default());

    let summary = conversation.submit_and_drain("go", None).await.unwrap();

    assert_eq!(summary.items, 2);
    assert_eq!(
        conversation.console().titles(),
        vec!["Streaming Update", "Streaming Update"]
    );
    match &conversation.console().shown[1] {
        Shown::Render { payload, .. } => {
            assert_eq!(payload["task"]["id"], "t1");
            assert_eq!(payload["task"]["status"]["state"], "completed");
            assert_eq!(payload["update"]["kind"], "status-update");
            assert_eq!(payload["update"]["final"], true);
        }
        other => panic!("expected a render, got {other:?}"),
    }
}

#[tokio::test]
async fn input_required_blocks_for_one_reply_and_continues_task() {
    let sender = ScriptedSender::new(vec![
        vec![Ok(task_update("t1", "c1", TaskState::InputRequired))],
        vec![Ok(task_update("t1", "c1", TaskState::Completed))],
    ]);
    let console = ScriptedConsole::new(&["continue"]);
    let mut conversation = Conversation::new(sender, console);

    let summary = conversation.submit_and_drain("book a table", None).await.unwrap();

    assert_eq!(summary.submissions, 2);
    assert_eq!(summary.items, 2);
    assert_eq!(conversation.console().prompts(), vec![FOLLOW_UP_PROMPT]);

    let sent = conversation.sender().sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].task_id.is_none());
    assert!(sent[0].context_id.is_none());
    assert_eq!(sent[1].text(), "continue");
    assert_eq!(sent[1].task_id.as_deref(), Some("t1"));
    assert_eq!(sent[1].context_id.as_deref(), Some("c1"));
    assert_ne!(sent[0].message_id, sent[1].message_id);
}

#[tokio::test]
async fn input_required_transitions_through_follow_up() {
    let sender = ScriptedSender::new(vec![
        vec![Ok(task_update("t1", "c1", TaskState::InputRequired))],
        vec![Ok(task_update("t1", "c1", TaskState::Completed))],
    ]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::new(&["continue"]));

    conversation.submit_and_drain("book a table", None).await.unwrap();

    assert_eq!(
        conversation.transitions(),
        [
            ConversationState::New,
            ConversationState::AwaitingAgent,
            ConversationState::InputRequired(Correlation::new("t1", "c1")),
            ConversationState::AwaitingAgent,
            ConversationState::Done,
        ]
    );
    assert_eq!(conversation.state(), &ConversationState::Done);
}

#[tokio::test]
async fn transitions_restart_with_each_drain() {
    let sender = ScriptedSender::new(vec![
        vec![Ok(task_update("t1", "c1", TaskState::InputRequired))],
        vec![Ok(agent_reply("done"))],
        vec![Ok(agent_reply("It is noon."))],
    ]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::new(&["more"]));

    conversation.submit_and_drain("first", None).await.unwrap();
    assert_eq!(conversation.transitions().len(), 5);

    conversation.submit_and_drain("second", None).await.unwrap();
    assert_eq!(
        conversation.transitions(),
        [
            ConversationState::New,
            ConversationState::AwaitingAgent,
            ConversationState::Done,
        ]
    );
}

#[tokio::test]
async fn outer_stream_resumes_after_nested_follow_up() {
    let sender = ScriptedSender::new(vec![
        vec![
            Ok(task_update("t1", "c1", TaskState::InputRequired)),
            Ok(agent_reply("outer tail")),
        ],
        vec![Ok(agent_reply("nested reply"))],
    ]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::new(&["more"]));

    let summary = conversation.submit_and_drain("start", None).await.unwrap();

    assert_eq!(summary.items, 3);
    let rendered: Vec<String> = conversation
        .console()
        .shown
        .iter()
        .filter_map(|s| match s {
            Shown::Render { payload, .. } => payload["parts"][0]["text"].as_str().map(String::from),
            _ => None,
        })
        .collect();
    assert_eq!(rendered, vec!["nested reply", "outer tail"]);
}

#[tokio::test]
async fn repeated_input_required_is_followed_without_recursion() {
    let turns = 200;
    let mut responses: Vec<_> = (0..turns)
        .map(|_| vec![Ok(task_update("t1", "c1", TaskState::InputRequired))])
        .collect();
    responses.push(vec![Ok(task_update("t1", "c1", TaskState::Completed))]);
    let replies: Vec<String> = (0..turns).map(|i| format!("reply {i}")).collect();
    let reply_refs: Vec<&str> = replies.iter().map(String::as_str).collect();

    let mut conversation = Conversation::new(
        ScriptedSender::new(responses),
        ScriptedConsole::new(&reply_refs),
    );

    let summary = conversation.submit_and_drain("start", None).await.unwrap();

    assert_eq!(summary.submissions, turns + 1);
    let sent = conversation.sender().sent();
    assert!(sent[1..]
        .iter()
        .all(|m| m.task_id.as_deref() == Some("t1") && m.context_id.as_deref() == Some("c1")));
}

#[tokio::test]
async fn closed_input_at_follow_up_ends_conversation() {
    let sender = ScriptedSender::new(vec![vec![Ok(task_update(
        "t1",
        "c1",
        TaskState::InputRequired,
    ))]]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::default());

    let summary = conversation.submit_and_drain("hi", None).await.unwrap();

    assert_eq!(summary.submissions, 1);
    assert_eq!(conversation.console().notices(), vec![Notice::InputEnded]);
    assert_eq!(conversation.state(), &ConversationState::Done);
}

#[tokio::test]
async fn disconnect_in_nested_submission_resumes_outer() {
    let sender = ScriptedSender::new(vec![
        vec![
            Ok(task_update("t1", "c1", TaskState::InputRequired)),
            Ok(agent_reply("outer done")),
        ],
        vec![Ok(task_update("t1", "c1", TaskState::Working)), Err(disconnected())],
    ]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::new(&["more"]));

    let summary = conversation.submit_and_drain("start", None).await.unwrap();

    assert_eq!(summary.disconnects, 1);
    assert_eq!(summary.items, 3);
    assert_eq!(conversation.console().notices(), vec![Notice::Disconnected]);
    assert_eq!(conversation.console().titles().last(), Some(&"Agent Reply"));
}

#[tokio::test]
async fn other_errors_propagate_from_drain() {
    let sender = ScriptedSender::new(vec![vec![
        Ok(task_update("t1", "c1", TaskState::Working)),
        Err(A2AError::InvalidJson("garbled event".to_string())),
    ]]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::default());

    let err = conversation.submit_and_drain("go", None).await.unwrap_err();

    assert!(matches!(err, A2AError::InvalidJson(_)));
    assert!(conversation.console().notices().is_empty());
}

#[tokio::test]
async fn explicit_correlation_is_sent_as_given() {
    let sender = ScriptedSender::new(vec![vec![Ok(agent_reply("ok"))]]);
    let mut conversation = Conversation::new(sender, ScriptedConsole::default());

    conversation
        .submit_and_drain("resume", Some(Correlation::new("t9", "c9")))
        .await
        .unwrap();

    let sent = conversation.sender().sent();
    assert_eq!(sent[0].task_id.as_deref(), Some("t9"));
    assert_eq!(sent[0].context_id.as_deref(), Some("c9"));
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[tokio::test]
async fn what_time_is_it_scenario() {
    let sender = ScriptedSender::new(vec![vec![Ok(agent_reply("It is 10:00."))]]);
    let console = ScriptedConsole::new(&["What time is it?"]);
    let mut conversation = Conversation::new(sender, console);

    conversation.interactive_loop().await.unwrap();

    let sent = conversation.sender().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text(), "What time is it?");
    assert!(sent[0].task_id.is_none());
    assert!(sent[0].context_id.is_none());

    let console = conversation.console();
    assert_eq!(console.titles(), vec!["Agent Reply"]);
    assert!(!console.notices().contains(&Notice::NoResponse));
    // Prompted again after the reply.
    assert_eq!(console.prompts(), vec![QUERY_PROMPT, QUERY_PROMPT]);
}

#[tokio::test]
async fn input_required_then_completed_scenario() {
    let sender = ScriptedSender::new(vec![
        vec![Ok(task_update("t1", "c1", TaskState::InputRequired))],
        vec![Ok(task_update("t1", "c1", TaskState::Completed))],
    ]);
    let console = ScriptedConsole::new(&["reserve a table", "continue", "exit"]);
    let mut conversation = Conversation::new(sender, console);

    conversation.interactive_loop().await.unwrap();

    let sent = conversation.sender().sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].text(), "continue");
    assert_eq!(sent[1].task_id.as_deref(), Some("t1"));
    assert_eq!(sent[1].context_id.as_deref(), Some("c1"));
    assert_eq!(
        conversation.console().prompts(),
        vec![QUERY_PROMPT, FOLLOW_UP_PROMPT, QUERY_PROMPT]
    );
}
