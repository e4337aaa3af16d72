use crate::quiz::QuizSession;

/// An option collected by the test-building wizard before it is written to
/// the store; exactly one of the two fields is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDraft {
    pub text: Option<String>,
    pub image_path: Option<String>,
}

/// Per-user dialogue state. One state per user at a time, held in the
/// dispatcher's dialogue storage and discarded on cancel or completion.
#[derive(Debug, Clone, Default)]
pub enum State {
    #[default]
    Idle,

    // Student registration
    RegisterFirstName,
    RegisterLastName {
        first_name: String,
    },
    RegisterClassNumber {
        first_name: String,
        last_name: String,
    },

    // Task authoring (teacher)
    NewTaskTitle,
    NewTaskDescription {
        title: String,
    },
    NewTaskFile {
        title: String,
        description: String,
    },

    // Task distribution (teacher)
    SendTaskClass {
        task_id: i64,
    },
    SendTaskMethod {
        task_id: i64,
        class_number: i64,
    },
    SendTaskSchedule {
        task_id: i64,
        class_number: i64,
    },

    // Homework answers (student)
    AnswerTaskCollect {
        task_id: i64,
        text: Option<String>,
        files: Vec<String>,
    },

    // Test authoring wizard (teacher)
    NewTestTitle,
    NewTestMaxAttempts {
        title: String,
    },
    NewTestQuestionText {
        test_id: i64,
    },
    NewTestQuestionFile {
        test_id: i64,
        question_text: String,
    },
    NewTestQuestionKind {
        test_id: i64,
        question_text: String,
        question_file: Option<String>,
    },
    NewTestOption {
        test_id: i64,
        question_id: i64,
        options: Vec<OptionDraft>,
    },
    NewTestCorrectOption {
        test_id: i64,
        question_id: i64,
        options: Vec<OptionDraft>,
    },
    NewTestCorrectText {
        test_id: i64,
        question_id: i64,
    },
    NewTestAddMore {
        test_id: i64,
    },

    // Quiz runtime (student)
    TakingQuiz {
        session: QuizSession,
    },
}
