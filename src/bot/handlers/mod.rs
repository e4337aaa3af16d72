pub mod callback;
pub mod menu;
pub mod quiz_authoring;
pub mod quiz_runtime;
pub mod register;
pub mod results;
pub mod tasks;

use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::{dialogue, UpdateHandler};
use teloxide::prelude::*;

use crate::bot::commands::Command;
use crate::bot::state::State;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
pub type BotDialogue = Dialogue<State, InMemStorage<State>>;

pub struct BotHandler;

impl BotHandler {
    /// The full update-handling tree: commands first, then the active
    /// dialogue step, then the main-menu fallback; callback queries go
    /// through a single prefix dispatcher.
    pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
        use dptree::case;

        let message_handler = Update::filter_message()
            .branch(
                teloxide::filter_command::<Command, _>()
                    .endpoint(crate::bot::commands::command_handler),
            )
            .branch(case![State::RegisterFirstName].endpoint(register::receive_first_name))
            .branch(case![State::RegisterLastName { first_name }].endpoint(register::receive_last_name))
            .branch(
                case![State::RegisterClassNumber {
                    first_name,
                    last_name
                }]
                .endpoint(register::receive_class_number),
            )
            .branch(case![State::NewTaskTitle].endpoint(tasks::receive_task_title))
            .branch(case![State::NewTaskDescription { title }].endpoint(tasks::receive_task_description))
            .branch(
                case![State::NewTaskFile { title, description }].endpoint(tasks::receive_task_file),
            )
            .branch(
                case![State::SendTaskSchedule {
                    task_id,
                    class_number
                }]
                .endpoint(tasks::receive_schedule_time),
            )
            .branch(
                case![State::AnswerTaskCollect {
                    task_id,
                    text,
                    files
                }]
                .endpoint(tasks::receive_answer_part),
            )
            .branch(case![State::NewTestTitle].endpoint(quiz_authoring::receive_title))
            .branch(case![State::NewTestMaxAttempts { title }].endpoint(quiz_authoring::receive_max_attempts))
            .branch(case![State::NewTestQuestionText { test_id }].endpoint(quiz_authoring::receive_question_text))
            .branch(
                case![State::NewTestQuestionFile {
                    test_id,
                    question_text
                }]
                .endpoint(quiz_authoring::receive_question_file),
            )
            .branch(
                case![State::NewTestQuestionKind {
                    test_id,
                    question_text,
                    question_file
                }]
                .endpoint(quiz_authoring::receive_question_kind),
            )
            .branch(
                case![State::NewTestOption {
                    test_id,
                    question_id,
                    options
                }]
                .endpoint(quiz_authoring::receive_option),
            )
            .branch(
                case![State::NewTestCorrectOption {
                    test_id,
                    question_id,
                    options
                }]
                .endpoint(quiz_authoring::receive_correct_option),
            )
            .branch(
                case![State::NewTestCorrectText {
                    test_id,
                    question_id
                }]
                .endpoint(quiz_authoring::receive_correct_text),
            )
            .branch(case![State::NewTestAddMore { test_id }].endpoint(quiz_authoring::receive_add_more))
            .branch(case![State::TakingQuiz { session }].endpoint(quiz_runtime::receive_text_answer))
            .branch(dptree::endpoint(menu::menu_handler));

        let callback_handler =
            Update::filter_callback_query().endpoint(callback::callback_handler);

        dialogue::enter::<Update, InMemStorage<State>, State, _>()
            .branch(message_handler)
            .branch(callback_handler)
    }
}
