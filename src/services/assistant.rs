use crate::models::{DialogueState, Extraction, Intent, Session};
use crate::services::ai::extraction::{merge_fields, FieldExtractor};
use crate::services::dialogue::{self, menu_choice, MenuChoice, Turn, RESET_TOKEN};
use crate::services::replies;

/// Runs one step of the model-assisted dialogue (MENU / CHAT / CONFIRM).
pub async fn step(mut session: Session, input: &str, extractor: &dyn FieldExtractor) -> Turn {
    let input = input.trim();

    if input == RESET_TOKEN {
        session.reset();
        return Turn::reply(session, replies::reset());
    }

    match session.state {
        DialogueState::Menu => menu_step(session, input, extractor).await,
        DialogueState::Chat => chat_step(session, input, extractor).await,
        DialogueState::Confirm => confirm_step(session, input, extractor).await,
        _ => dialogue::safety_reset(session),
    }
}

async fn menu_step(mut session: Session, input: &str, extractor: &dyn FieldExtractor) -> Turn {
    match menu_choice(input) {
        Some(MenuChoice::Reserve) => {
            session.state = DialogueState::Chat;
            return Turn::reply(session, replies::CHAT_INTRO);
        }
        Some(MenuChoice::Info) => return Turn::reply(session, replies::INFO),
        Some(MenuChoice::Help) => return Turn::reply(session, replies::HELP),
        None => {}
    }

    let extraction = extractor.extract(input, session.state, &session.data).await;
    let changed = merge_fields(&mut session.data, &extraction.fields);

    match extraction.intent {
        Intent::Info => Turn::reply(session, replies::INFO),
        Intent::Help => Turn::reply(session, replies::HELP),
        Intent::Reserve => advance(session, extraction),
        _ if !changed.is_empty() => advance(session, extraction),
        _ => Turn::reply(session, non_blank(extraction.reply, replies::unrecognized_option)),
    }
}

async fn chat_step(mut session: Session, input: &str, extractor: &dyn FieldExtractor) -> Turn {
    let extraction = extractor.extract(input, session.state, &session.data).await;
    let changed = merge_fields(&mut session.data, &extraction.fields);

    tracing::debug!(
        user = %session.id,
        intent = ?extraction.intent,
        changed = changed.len(),
        "merged extracted fields"
    );

    match extraction.intent {
        Intent::Cancel => dialogue::cancel(session),
        Intent::Menu if changed.is_empty() => {
            session.state = DialogueState::Menu;
            Turn::reply(session, non_blank(extraction.reply, || replies::MENU.to_string()))
        }
        _ => advance(session, extraction),
    }
}

async fn confirm_step(session: Session, input: &str, extractor: &dyn FieldExtractor) -> Turn {
    if !session.data.is_complete() {
        return dialogue::safety_reset(session);
    }
    let mut session = match dialogue::confirm_choice(session, input) {
        Ok(turn) => return turn,
        Err(session) => session,
    };

    let extraction = extractor.extract(input, session.state, &session.data).await;
    match extraction.intent {
        Intent::Confirm => dialogue::commit(session),
        Intent::Cancel => dialogue::cancel(session),
        _ => {
            if merge_fields(&mut session.data, &extraction.fields).is_empty() {
                Turn::reply(session, replies::INVALID_CONFIRM)
            } else {
                let summary = replies::summary(&session.data);
                Turn::reply(session, summary)
            }
        }
    }
}

/// Moves to CONFIRM once every field is filled, otherwise keeps chatting.
fn advance(mut session: Session, extraction: Extraction) -> Turn {
    match session.data.first_missing() {
        None => {
            session.state = DialogueState::Confirm;
            let summary = replies::summary(&session.data);
            Turn::reply(session, summary)
        }
        Some(missing) => {
            session.state = DialogueState::Chat;
            let reply = if extraction.ready_to_confirm {
                replies::ask(missing).to_string()
            } else {
                non_blank(extraction.reply, || replies::ask(missing).to_string())
            };
            Turn::reply(session, reply)
        }
    }
}

fn non_blank(reply: String, default: impl FnOnce() -> String) -> String {
    if reply.trim().is_empty() {
        default()
    } else {
        reply
    }
}
