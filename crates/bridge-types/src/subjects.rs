// ── Work queue (mention webhook → JetStream → answer worker) ────────────────

/// JetStream stream holding pending mention work items.
pub const DIFY_WORK_STREAM: &str = "DIFY_MENTIONS";

/// One [`MentionWorkItem`](crate::MentionWorkItem) per accepted mention.
pub const DIFY_WORK_SUBJECT: &str = "dify.mention.work";

/// Durable pull consumer shared by every answer worker replica.
pub const DIFY_WORK_CONSUMER: &str = "dify-answer-workers";

// ── Command dispatch (slash-command webhook → external processor) ───────────

/// Core NATS subject; the processor subscribes, nobody replies.
pub const DIFY_COMMAND_SUBJECT: &str = "dify.command.dispatch";
