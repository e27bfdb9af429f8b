mod config;
mod quiz;

use std::sync::Arc;

use config::Config;
use dotenv::dotenv;
use log::{debug, info, warn};
use quiz::{
    error::QuizError,
    session::{Controller, Prompt, SessionState},
    trivia::{OpenTriviaDb, QuestionSource},
    Category,
};
use rand::{rngs::StdRng, SeedableRng};
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type Source = Arc<dyn QuestionSource>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveCategory,
    Quiz {
        session: SessionState,
    },
    ChangeCategory {
        session: SessionState,
    },
}

type SessionStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() {
    // A missing .env is fine, the variables may come from the real environment
    if dotenv().is_err() {
        println!("No .env file found, using the process environment");
    }

    pretty_env_logger::init();
    log::info!("Starting adaptive quiz bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let table = quiz::policy::train(&config.training, &mut rng);
    if table.entries().any(|v| !v.is_finite()) {
        log::error!("Training produced non-finite values:\n{}", table);
        std::process::exit(1);
    }
    info!("Trained difficulty policy:\n{}", table);

    let controller = Arc::new(Controller::new(Arc::new(table), config.max_questions));
    let source: Source = match OpenTriviaDb::new(config.trivia_url.clone(), config.trivia_timeout) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            log::error!("Unable to build the trivia client: {}", err);
            std::process::exit(1);
        }
    };

    let bot = Bot::from_env();
    let storage: SessionStorage = InMemStorage::<State>::new().erase();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveCategory].endpoint(receive_category))
            .branch(dptree::case![State::Quiz { session }].endpoint(quiz_turn))
            .branch(dptree::case![State::ChangeCategory { session }].endpoint(change_category)),
    )
    .dependencies(dptree::deps![storage, controller, source])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const GREETING_TEXT: &str = "Hi! I'm your personal learning tutor. Answer the questions and I'll adapt the difficulty as we go!";
const CHANGE_CATEGORY: &str = "Change genre";
const RESTART_QUIZ: &str = "Restart quiz";

fn category_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(
        Category::ALL
            .iter()
            .map(|c| vec![KeyboardButton::new(c.name())])
            .collect::<Vec<_>>(),
    )
}

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;
    bot.send_message(msg.chat.id, "Select a genre:")
        .reply_markup(category_keyboard())
        .await?;

    dialogue.update(State::ReceiveCategory).await?;
    Ok(())
}

async fn receive_category(
    bot: Bot,
    dialogue: QuizDialogue,
    controller: Arc<Controller>,
    source: Source,
    msg: Message,
) -> HandlerResult {
    let Some(category) = msg.text().and_then(Category::from_name) else {
        bot.send_message(msg.chat.id, "Please choose one of the genres")
            .reply_markup(category_keyboard())
            .await?;
        return Ok(());
    };

    let mut session = controller.initialize_session(category);
    controller.refresh_question(&mut session, source.as_ref()).await;
    show_prompt(&bot, &msg, &controller, &session).await?;

    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn change_category(
    bot: Bot,
    dialogue: QuizDialogue,
    controller: Arc<Controller>,
    source: Source,
    mut session: SessionState,
    msg: Message,
) -> HandlerResult {
    let Some(category) = msg.text().and_then(Category::from_name) else {
        bot.send_message(msg.chat.id, "Please choose one of the genres")
            .reply_markup(category_keyboard())
            .await?;
        return Ok(());
    };

    controller.on_category_change(&mut session, category);
    controller.refresh_question(&mut session, source.as_ref()).await;
    show_prompt(&bot, &msg, &controller, &session).await?;

    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn quiz_turn(
    bot: Bot,
    dialogue: QuizDialogue,
    controller: Arc<Controller>,
    source: Source,
    mut session: SessionState,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(RESTART_QUIZ) => {
            controller.reset(&mut session);
            bot.send_message(msg.chat.id, "Starting over!").await?;
        }
        Some(CHANGE_CATEGORY) => {
            bot.send_message(msg.chat.id, "Select a genre:")
                .reply_markup(category_keyboard())
                .await?;
            dialogue.update(State::ChangeCategory { session }).await?;
            return Ok(());
        }
        choice => match controller.record_answer(&mut session, choice) {
            Ok(outcome) => {
                debug!(
                    "Chat {} moves to {} questions",
                    msg.chat.id.0, outcome.next_difficulty
                );
                let feedback = if outcome.was_correct {
                    "Correct!".to_string()
                } else {
                    format!("Incorrect! The correct answer is: {}", outcome.correct_answer)
                };
                bot.send_message(msg.chat.id, feedback).await?;
            }
            Err(QuizError::InvalidSelection) => {
                warn!("Chat {} sent an answer that is not an option", msg.chat.id.0);
                bot.send_message(msg.chat.id, "Please select an option!").await?;
            }
            // Nothing to answer yet, fall through to fetching a question
            Err(QuizError::NoActiveQuestion) => {}
            Err(err) => {
                info!("Chat {}: {}", msg.chat.id.0, err);
            }
        },
    }

    controller.refresh_question(&mut session, source.as_ref()).await;
    show_prompt(&bot, &msg, &controller, &session).await?;

    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn show_prompt(
    bot: &Bot,
    msg: &Message,
    controller: &Controller,
    session: &SessionState,
) -> HandlerResult {
    let controls = vec![
        KeyboardButton::new(CHANGE_CATEGORY),
        KeyboardButton::new(RESTART_QUIZ),
    ];

    let question = match controller.next_prompt(session) {
        Prompt::Question(question) => question,
        Prompt::Unavailable => {
            bot.send_message(
                msg.chat.id,
                "Failed to fetch a question. Send any message to try again.",
            )
            .reply_markup(KeyboardMarkup::new(vec![controls]))
            .await?;
            return Ok(());
        }
        Prompt::Complete {
            score,
            max_questions,
        } => {
            let summary = format!(
                "Quiz completed!\nYour final score: {} / {}",
                score, max_questions
            );
            bot.send_message(msg.chat.id, summary)
                .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(
                    RESTART_QUIZ,
                )]]))
                .await?;
            return Ok(());
        }
    };

    let question_text = format!(
        "Genre: {}\nDifficulty: {}\nQuestion {}: {}\n\nYour score: {} / {}",
        session.category(),
        session.difficulty(),
        session.questions() + 1,
        question.text,
        session.score(),
        session.questions()
    );

    let mut keyboard = question
        .options()
        .map(|option| vec![KeyboardButton::new(option)])
        .collect::<Vec<_>>();
    keyboard.push(controls);

    bot.send_message(msg.chat.id, question_text)
        .reply_markup(KeyboardMarkup::new(keyboard))
        .await?;
    Ok(())
}
