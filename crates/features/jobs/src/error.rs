use std::borrow::Cow;

#[beacon_derive::beacon_error]
pub enum JobError {
    #[error("Job not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The id already has an advancement task.
    #[error("Job already scheduled{}: {message}", format_context(.context))]
    AlreadyScheduled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A blocking poll gave up before the job finished.
    #[error("Timed out waiting for job{}: {message}", format_context(.context))]
    Timeout { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid job configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal job error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl JobError {
    pub(crate) fn not_found(id: &crate::JobId) -> Self {
        Self::NotFound { message: id.to_string().into(), context: None }
    }
}
