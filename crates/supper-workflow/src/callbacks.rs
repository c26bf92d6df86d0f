// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline-button payloads.
//!
//! Dinner ids contain colons themselves (`dinner:{channel}:{millis}`), so
//! payloads are split on the first colon and, for ratings, the last one.

use std::fmt;

use supper_core::{InlineButton, InlineKeyboard};

use crate::messages;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Volunteer { poll_id: String },
    DinnerReady { dinner_id: String },
    Rate { dinner_id: String, stars: u8 },
    UpdateFridge { dinner_id: String },
    SkipUpdateFridge,
    DoneAdding,
    AddMore,
    DonePhotos,
    CancelPhotos,
}

/// Why a payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackParseError {
    Unknown,
    BadRating,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Result<Self, CallbackParseError> {
        match data {
            "skip_update_fridge" => return Ok(Self::SkipUpdateFridge),
            "done_adding" => return Ok(Self::DoneAdding),
            "add_more" => return Ok(Self::AddMore),
            "done_adding_photos" => return Ok(Self::DonePhotos),
            "cancel_adding_photos" => return Ok(Self::CancelPhotos),
            _ => {}
        }

        let (kind, rest) = data.split_once(':').ok_or(CallbackParseError::Unknown)?;
        if rest.is_empty() {
            return Err(CallbackParseError::Unknown);
        }
        match kind {
            "volunteer" => Ok(Self::Volunteer {
                poll_id: rest.to_string(),
            }),
            "dinner_ready" => Ok(Self::DinnerReady {
                dinner_id: rest.to_string(),
            }),
            "update_fridge" => Ok(Self::UpdateFridge {
                dinner_id: rest.to_string(),
            }),
            "rate" => {
                let (dinner_id, stars) = rest.rsplit_once(':').ok_or(CallbackParseError::BadRating)?;
                let stars: u8 = stars.parse().map_err(|_| CallbackParseError::BadRating)?;
                if dinner_id.is_empty() || !(1..=5).contains(&stars) {
                    return Err(CallbackParseError::BadRating);
                }
                Ok(Self::Rate {
                    dinner_id: dinner_id.to_string(),
                    stars,
                })
            }
            _ => Err(CallbackParseError::Unknown),
        }
    }

    fn button(&self, text: &str) -> InlineButton {
        InlineButton::new(text, self.to_string())
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volunteer { poll_id } => write!(f, "volunteer:{poll_id}"),
            Self::DinnerReady { dinner_id } => write!(f, "dinner_ready:{dinner_id}"),
            Self::Rate { dinner_id, stars } => write!(f, "rate:{dinner_id}:{stars}"),
            Self::UpdateFridge { dinner_id } => write!(f, "update_fridge:{dinner_id}"),
            Self::SkipUpdateFridge => f.write_str("skip_update_fridge"),
            Self::DoneAdding => f.write_str("done_adding"),
            Self::AddMore => f.write_str("add_more"),
            Self::DonePhotos => f.write_str("done_adding_photos"),
            Self::CancelPhotos => f.write_str("cancel_adding_photos"),
        }
    }
}

pub fn volunteer_keyboard(poll_id: &str) -> InlineKeyboard {
    let action = CallbackAction::Volunteer {
        poll_id: poll_id.to_string(),
    };
    InlineKeyboard::row(vec![action.button(messages::VOLUNTEER_BUTTON)])
}

pub fn dinner_ready_keyboard(dinner_id: &str) -> InlineKeyboard {
    let action = CallbackAction::DinnerReady {
        dinner_id: dinner_id.to_string(),
    };
    InlineKeyboard::row(vec![action.button(messages::DINNER_READY_BUTTON)])
}

/// One to five stars on a single row.
pub fn rating_keyboard(dinner_id: &str) -> InlineKeyboard {
    InlineKeyboard::row(
        (1..=5u8)
            .map(|stars| {
                CallbackAction::Rate {
                    dinner_id: dinner_id.to_string(),
                    stars,
                }
                .button(&"⭐".repeat(usize::from(stars)))
            })
            .collect(),
    )
}

pub fn update_fridge_keyboard(dinner_id: &str) -> InlineKeyboard {
    InlineKeyboard::row(vec![
        CallbackAction::UpdateFridge {
            dinner_id: dinner_id.to_string(),
        }
        .button(messages::UPDATE_FRIDGE_YES),
        CallbackAction::SkipUpdateFridge.button(messages::UPDATE_FRIDGE_NO),
    ])
}

pub fn more_or_done_keyboard() -> InlineKeyboard {
    InlineKeyboard::row(vec![
        CallbackAction::DoneAdding.button(messages::DONE_ADDING_BUTTON),
        CallbackAction::AddMore.button(messages::ADD_MORE_BUTTON),
    ])
}

pub fn done_photos_keyboard() -> InlineKeyboard {
    InlineKeyboard::row(vec![CallbackAction::DonePhotos.button(messages::DONE_PHOTOS_BUTTON)])
}

pub fn cancel_photos_keyboard() -> InlineKeyboard {
    InlineKeyboard::row(vec![CallbackAction::CancelPhotos.button(messages::CANCEL_BUTTON)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dinner_ids_keep_their_colons() {
        let id = "dinner:-100:1760000000000";
        assert_eq!(
            CallbackAction::parse(&format!("dinner_ready:{id}")),
            Ok(CallbackAction::DinnerReady {
                dinner_id: id.into()
            })
        );
        assert_eq!(
            CallbackAction::parse(&format!("rate:{id}:4")),
            Ok(CallbackAction::Rate {
                dinner_id: id.into(),
                stars: 4
            })
        );
    }

    #[test]
    fn bad_ratings_are_reported() {
        assert_eq!(
            CallbackAction::parse("rate:dinner:1:2:9"),
            Err(CallbackParseError::BadRating)
        );
        assert_eq!(
            CallbackAction::parse("rate:dinner:1:2:x"),
            Err(CallbackParseError::BadRating)
        );
        assert_eq!(CallbackAction::parse("rate:5"), Err(CallbackParseError::BadRating));
    }

    #[test]
    fn unknown_payloads() {
        assert_eq!(CallbackAction::parse("show_fridge"), Err(CallbackParseError::Unknown));
        assert_eq!(CallbackAction::parse("volunteer:"), Err(CallbackParseError::Unknown));
    }

    #[test]
    fn keyboards_carry_parseable_payloads() {
        let boards = [
            volunteer_keyboard("p1"),
            dinner_ready_keyboard("dinner:1:2"),
            rating_keyboard("dinner:1:2"),
            update_fridge_keyboard("dinner:1:2"),
            more_or_done_keyboard(),
            done_photos_keyboard(),
            cancel_photos_keyboard(),
        ];
        for board in &boards {
            for data in board.callback_data() {
                assert!(CallbackAction::parse(data).is_ok(), "{data}");
            }
        }
        assert_eq!(rating_keyboard("d").rows[0].len(), 5);
    }
}
