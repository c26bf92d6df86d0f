// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound chat events: poll ballots, button presses, commands, text and photos.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use supper_core::{ChannelId, InboundEvent, MessageRef, Sender, SupperError, with_timeout};
use tracing::{debug, info, warn};

use crate::callbacks::{self, CallbackAction, CallbackParseError};
use crate::fridge::compare_ingredients;
use crate::keys;
use crate::messages;
use crate::models::Dish;
use crate::orchestrator::Orchestrator;
use crate::session::ChatMode;

/// Plain-text messages shorter than this with no spaces are taken as a
/// single ingredient.
const SINGLE_INGREDIENT_MAX_CHARS: usize = 30;

/// Button press context shared by the callback handlers.
struct Press<'a> {
    id: &'a str,
    chat: ChannelId,
    message: MessageRef,
    message_text: Option<&'a str>,
    from: &'a Sender,
}

pub struct EventHandler {
    orch: Arc<Orchestrator>,
}

impl EventHandler {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orch: orchestrator,
        }
    }

    /// Handles one inbound event.
    ///
    /// Users get an apology for failures; the error is still returned so the
    /// event loop can log it.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), SupperError> {
        match event {
            InboundEvent::PollAnswer {
                poll_id,
                user,
                option_ids,
            } => self.on_poll_answer(&poll_id, &user, &option_ids).await,
            InboundEvent::Callback {
                id,
                chat,
                message,
                message_text,
                from,
                data,
            } => {
                let press = Press {
                    id: &id,
                    chat,
                    message,
                    message_text: message_text.as_deref(),
                    from: &from,
                };
                let result = self.on_callback(&press, &data).await;
                if result.is_err() {
                    self.orch.answer(&id, messages::TRY_AGAIN).await;
                }
                result
            }
            InboundEvent::Message {
                chat,
                from,
                text,
                photo_file_id,
                ..
            } => {
                if let Err(e) = self.orch.channels.ensure(chat).await {
                    warn!(channel = %chat, error = %e, "failed to register channel");
                }
                let result = self
                    .on_message(chat, &from, text.as_deref(), photo_file_id.as_deref())
                    .await;
                if result.is_err() {
                    self.orch.notify(chat, messages::GENERIC_ERROR).await;
                }
                result
            }
        }
    }

    // --- ballots ---

    async fn on_poll_answer(
        &self,
        poll_id: &str,
        user: &Sender,
        option_ids: &[u32],
    ) -> Result<(), SupperError> {
        let orch = &self.orch;
        let channel = match orch.votes.resolve_channel_for_poll(poll_id).await {
            Ok(channel) => channel,
            Err(SupperError::NotFound { .. }) => {
                debug!(poll_id, "ballot for an unknown poll ignored");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let _guard = orch.locks.lock(channel).await;
        let vote = orch.votes.get(channel, poll_id).await?;
        if vote.is_ended() {
            debug!(channel = %channel, poll_id, "ballot for an ended vote ignored");
            return Ok(());
        }

        // Polls are single-choice; an empty answer is a retraction.
        match option_ids.first() {
            None => {
                orch.votes.retract_vote(channel, poll_id, user.id).await?;
            }
            Some(&index) => {
                let option = usize::try_from(index)
                    .ok()
                    .and_then(|i| vote.options.get(i))
                    .ok_or_else(|| {
                        SupperError::InvalidInput(format!("invalid option index: {index}"))
                    })?;
                orch.votes
                    .record_vote(channel, poll_id, user.id, option)
                    .await?;
            }
        }

        let members = self.refresh_member_count(channel).await?;
        let check = orch
            .votes
            .check_quorum(channel, poll_id, members, orch.settings.quorum)
            .await?;
        let Some(winner) = check.winner.filter(|_| check.reached) else {
            return Ok(());
        };

        orch.votes
            .end_vote(channel, poll_id, Some(winner.clone()))
            .await?;
        info!(channel = %channel, poll_id, winner = %winner, members, "quorum reached");
        orch.notify(channel, &messages::poll_closed(&winner)).await;
        orch.notify_keyboard(
            channel,
            &messages::who_cooks(&winner),
            callbacks::volunteer_keyboard(poll_id),
        )
        .await;
        Ok(())
    }

    /// Member count without the bot. Keeps the stored count (or the default
    /// when none is known) if the transport cannot answer.
    async fn refresh_member_count(&self, channel: ChannelId) -> Result<u32, SupperError> {
        let orch = &self.orch;
        match orch.member_count(channel).await {
            Ok(total) => {
                let members = total.saturating_sub(1);
                orch.channels.set_member_count(channel, members).await?;
                Ok(members)
            }
            Err(e) => {
                let known = orch
                    .channels
                    .get(channel)
                    .await?
                    .map_or(0, |state| state.member_count);
                let members = if known == 0 {
                    orch.settings.default_member_count
                } else {
                    known
                };
                warn!(channel = %channel, error = %e, members, "member count unavailable, using fallback");
                Ok(members)
            }
        }
    }

    // --- buttons ---

    async fn on_callback(&self, press: &Press<'_>, data: &str) -> Result<(), SupperError> {
        let action = match CallbackAction::parse(data) {
            Ok(action) => action,
            Err(CallbackParseError::BadRating) => {
                self.orch.answer(press.id, messages::INVALID_RATING).await;
                return Ok(());
            }
            Err(CallbackParseError::Unknown) => {
                debug!(data, "unknown callback payload");
                self.orch.answer(press.id, messages::EXPIRED_BUTTON).await;
                return Ok(());
            }
        };

        match action {
            CallbackAction::Volunteer { poll_id } => self.on_volunteer(press, &poll_id).await,
            CallbackAction::DinnerReady { dinner_id } => self.on_dinner_ready(press, &dinner_id).await,
            CallbackAction::Rate { dinner_id, stars } => self.on_rate(press, &dinner_id, stars).await,
            CallbackAction::UpdateFridge { dinner_id } => self.on_update_fridge(press, &dinner_id).await,
            CallbackAction::SkipUpdateFridge => {
                self.orch.answer(press.id, messages::FRIDGE_NOT_UPDATED_ANSWER).await;
                self.edit_pressed(press, messages::FRIDGE_NOT_UPDATED).await;
                Ok(())
            }
            CallbackAction::DoneAdding => {
                self.orch.sessions.clear(press.chat);
                self.orch.answer(press.id, messages::DONE_ADDING_ANSWER).await;
                self.edit_pressed(press, messages::DONE_ADDING).await;
                Ok(())
            }
            CallbackAction::AddMore => {
                self.orch.sessions.set_mode(press.chat, ChatMode::AwaitingIngredients);
                self.orch.answer(press.id, messages::ADD_MORE_ANSWER).await;
                self.edit_pressed(press, messages::ADD_MORE).await;
                Ok(())
            }
            CallbackAction::DonePhotos => self.on_done_photos(press).await,
            CallbackAction::CancelPhotos => {
                self.orch.sessions.clear(press.chat);
                self.orch.answer(press.id, messages::PHOTOS_CANCELLED_ANSWER).await;
                self.edit_pressed(press, messages::PHOTOS_CANCELLED).await;
                Ok(())
            }
        }
    }

    async fn edit_pressed(&self, press: &Press<'_>, text: &str) {
        self.orch.replace(press.chat, Some(press.message), text).await;
    }

    /// Dinner buttons act only in the chat that owns the dinner. Returns
    /// `true` after answering a foreign press.
    async fn reject_foreign_dinner(&self, press: &Press<'_>, dinner_id: &str) -> bool {
        if keys::dinner_channel(dinner_id) == Some(press.chat) {
            return false;
        }
        warn!(channel = %press.chat, dinner_id, "dinner button pressed outside its chat");
        self.orch.answer(press.id, messages::EXPIRED_BUTTON).await;
        true
    }

    async fn on_volunteer(&self, press: &Press<'_>, poll_id: &str) -> Result<(), SupperError> {
        let orch = &self.orch;
        let chat = press.chat;
        let name = press.from.display_name();

        let vote = {
            let _guard = orch.locks.lock(chat).await;
            let pending = orch
                .channels
                .get(chat)
                .await?
                .and_then(|state| state.awaiting_cook)
                .is_some_and(|id| id == poll_id);
            // A restarted or closed request only answers for the cook it already has.
            let attempt = if pending {
                orch.votes.add_cook_volunteer(chat, poll_id, press.from.id).await
            } else {
                orch.votes.get(chat, poll_id).await.and_then(|vote| {
                    if vote.selected_cook.is_some() {
                        Ok(vote)
                    } else {
                        Err(SupperError::PreconditionFailed("cook request is no longer open".into()))
                    }
                })
            };
            let vote = match attempt {
                Ok(vote) => vote,
                Err(SupperError::PreconditionFailed(reason)) if reason == "did not vote for winning dish" => {
                    orch.answer(press.id, messages::NOT_ELIGIBLE_TO_COOK).await;
                    return Ok(());
                }
                Err(SupperError::PreconditionFailed(_) | SupperError::NotFound { .. }) => {
                    orch.answer(press.id, messages::EXPIRED_BUTTON).await;
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            match vote.selected_cook {
                Some(cook) if cook == press.from.id => {
                    orch.answer(press.id, messages::THANKS_FOR_VOLUNTEERING).await;
                    return Ok(());
                }
                Some(_) => {
                    let cook_name = self.current_cook_name(chat).await;
                    orch.answer(press.id, &messages::already_cooking(&cook_name)).await;
                    return Ok(());
                }
                None => {}
            }
            orch.votes.select_cook(chat, poll_id, press.from.id).await?
        };

        let Some(dish_name) = vote.winning_option.clone() else {
            return Err(SupperError::Internal(format!("vote {poll_id} has a cook but no winner")));
        };
        orch.answer(press.id, messages::THANKS_FOR_VOLUNTEERING).await;
        self.edit_pressed(press, &messages::volunteered(name, &dish_name)).await;

        let info = match orch.llm_call(orch.llm.dish_info(&dish_name, None)).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(channel = %chat, dish = %dish_name, error = %e, "recipe lookup failed");
                None
            }
        };
        let dish = match &info {
            Some(info) => Dish {
                name: if info.name.trim().is_empty() {
                    dish_name.clone()
                } else {
                    info.name.clone()
                },
                cuisine: info.cuisine.clone(),
                ingredients: info.ingredients_needed.clone(),
                instructions: info.instructions.clone(),
            },
            None => Dish {
                name: dish_name.clone(),
                ..Dish::default()
            },
        };

        let dinner = orch.dinners.create(chat, dish, press.from.id, name).await?;
        let text = match &info {
            Some(info) => messages::recipe(info, &dinner.dish.name),
            None => messages::no_recipe(&dish_name, name),
        };
        orch.notify_keyboard(chat, &text, callbacks::dinner_ready_keyboard(&dinner.id))
            .await;
        Ok(())
    }

    async fn current_cook_name(&self, chat: ChannelId) -> String {
        let dinner_id = match self.orch.channels.get(chat).await {
            Ok(Some(state)) => state.current_dinner,
            _ => None,
        };
        match dinner_id {
            Some(id) => match self.orch.dinners.get(&id).await {
                Ok(dinner) => dinner.cook_name,
                Err(_) => "someone".to_string(),
            },
            None => "someone".to_string(),
        }
    }

    async fn on_dinner_ready(&self, press: &Press<'_>, dinner_id: &str) -> Result<(), SupperError> {
        if self.reject_foreign_dinner(press, dinner_id).await {
            return Ok(());
        }
        let orch = &self.orch;
        let dinner = match orch.dinners.get(dinner_id).await {
            Ok(dinner) => dinner,
            Err(SupperError::NotFound { .. }) => {
                orch.answer(press.id, messages::EXPIRED_BUTTON).await;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if dinner.cook != press.from.id {
            orch.answer(press.id, messages::ONLY_COOK_CAN_FINISH).await;
            return Ok(());
        }

        let finished = {
            let _guard = orch.locks.lock(press.chat).await;
            let current = orch
                .channels
                .get(press.chat)
                .await?
                .and_then(|state| state.current_dinner);
            if current.as_deref() == Some(dinner_id) {
                Some(orch.dinners.finish(press.chat).await?)
            } else {
                None
            }
        };
        let Some(dinner) = finished else {
            orch.answer(press.id, messages::EXPIRED_BUTTON).await;
            return Ok(());
        };

        orch.answer(press.id, messages::DINNER_READY_ANSWER).await;
        let edited = format!("{}{}", press.message_text.unwrap_or_default(), messages::DINNER_READY_SUFFIX);
        self.edit_pressed(press, edited.trim_start()).await;
        orch.notify(press.chat, &messages::dinner_ready(&dinner)).await;
        orch.notify_keyboard(
            press.chat,
            messages::RATE_PROMPT,
            callbacks::rating_keyboard(&dinner.id),
        )
        .await;
        Ok(())
    }

    async fn on_rate(&self, press: &Press<'_>, dinner_id: &str, stars: u8) -> Result<(), SupperError> {
        if self.reject_foreign_dinner(press, dinner_id).await {
            return Ok(());
        }
        let orch = &self.orch;
        let dinner = match orch.dinners.rate(dinner_id, press.from.id, stars).await {
            Ok(dinner) => dinner,
            Err(SupperError::NotFound { .. }) => {
                orch.answer(press.id, messages::EXPIRED_BUTTON).await;
                return Ok(());
            }
            Err(SupperError::InvalidInput(_)) => {
                orch.answer(press.id, messages::INVALID_RATING).await;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        orch.answer(press.id, &messages::rating_thanks_answer(stars)).await;
        // The rating keyboard stays so the rest of the family can vote too.
        orch.notify(
            press.chat,
            &messages::rating_thanks(press.from.display_name(), stars),
        )
        .await;

        // Offer the fridge update once, with the first rating.
        if dinner.ratings.len() == 1
            && dinner.used_ingredients.is_empty()
            && !dinner.dish.ingredients.is_empty()
        {
            orch.notify_keyboard(
                press.chat,
                messages::UPDATE_FRIDGE_PROMPT,
                callbacks::update_fridge_keyboard(&dinner.id),
            )
            .await;
        }
        Ok(())
    }

    async fn on_update_fridge(&self, press: &Press<'_>, dinner_id: &str) -> Result<(), SupperError> {
        if self.reject_foreign_dinner(press, dinner_id).await {
            return Ok(());
        }
        let orch = &self.orch;
        let dinner = match orch.dinners.get(dinner_id).await {
            Ok(dinner) => dinner,
            Err(SupperError::NotFound { .. }) => {
                orch.answer(press.id, messages::EXPIRED_BUTTON).await;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if dinner.used_ingredients.is_empty() {
            let removed = orch
                .fridge
                .remove_used(press.chat, &dinner.dish.ingredients)
                .await?;
            debug!(channel = %press.chat, removed = removed.len(), "fridge updated after dinner");
            if let Err(e) = orch
                .dinners
                .record_used_ingredients(dinner_id, dinner.dish.ingredients.clone())
                .await
            {
                warn!(dinner_id, error = %e, "failed to record used ingredients");
            }
        }

        orch.answer(press.id, messages::FRIDGE_UPDATED_ANSWER).await;
        self.edit_pressed(press, messages::FRIDGE_UPDATED).await;
        let left = orch.fridge.list(press.chat).await?;
        if left.is_empty() {
            orch.notify(press.chat, messages::FRIDGE_NOW_EMPTY).await;
        } else {
            orch.notify(press.chat, &messages::fridge_leftovers(&left)).await;
        }
        Ok(())
    }

    async fn on_done_photos(&self, press: &Press<'_>) -> Result<(), SupperError> {
        let orch = &self.orch;
        orch.sessions.clear(press.chat);
        orch.answer(press.id, messages::DONE_PHOTOS_ANSWER).await;
        self.edit_pressed(press, messages::DONE_PHOTOS).await;

        let items = orch.fridge.list(press.chat).await?;
        if items.is_empty() {
            orch.notify(press.chat, messages::FRIDGE_STILL_EMPTY).await;
            return Ok(());
        }
        orch.notify(press.chat, &messages::fridge_contents(&items)).await;
        orch.notify(press.chat, messages::NEXT_STEP_DINNER).await;
        Ok(())
    }

    // --- messages ---

    async fn on_message(
        &self,
        chat: ChannelId,
        from: &Sender,
        text: Option<&str>,
        photo: Option<&str>,
    ) -> Result<(), SupperError> {
        let text = text.map(str::trim).unwrap_or_default();
        if let Some((command, args)) = parse_command(text) {
            return self.on_command(chat, from, &command, args, photo).await;
        }
        if let Some(file_id) = photo {
            return self.on_photo(chat, file_id).await;
        }
        if text.is_empty() {
            return Ok(());
        }
        self.on_text(chat, text).await
    }

    async fn on_command(
        &self,
        chat: ChannelId,
        from: &Sender,
        command: &str,
        args: &str,
        photo: Option<&str>,
    ) -> Result<(), SupperError> {
        let orch = &self.orch;
        debug!(channel = %chat, command, "command received");
        match command {
            "start" => {
                orch.notify(chat, &messages::welcome(&orch.settings.agent_name)).await;
            }
            "help" => orch.notify(chat, messages::HELP).await,
            "dinner" => {
                let outcome = orch.start_workflow(chat).await?;
                debug!(channel = %chat, ?outcome, "manual workflow start");
            }
            "fridge" | "show_fridge" => self.show_fridge(chat).await,
            "sync_fridge" => {
                orch.fridge.reset(chat).await?;
                orch.sessions.set_mode(chat, ChatMode::AwaitingIngredients);
                orch.notify(chat, messages::FRIDGE_RESET).await;
            }
            "add" => self.on_add(chat, args).await?,
            "add_photo" => {
                orch.sessions.set_mode(chat, ChatMode::AwaitingPhotos);
                match photo {
                    Some(file_id) => self.on_photo(chat, file_id).await?,
                    None => {
                        orch.notify_keyboard(
                            chat,
                            messages::SEND_PHOTOS,
                            callbacks::cancel_photos_keyboard(),
                        )
                        .await;
                    }
                }
            }
            "suggest" => self.on_suggest(chat, from, args).await?,
            "cuisines" => self.on_cuisines(chat, args).await?,
            "cancel" => {
                orch.sessions.clear(chat);
                orch.notify(chat, messages::CANCELLED).await;
            }
            other => debug!(channel = %chat, command = other, "unknown command ignored"),
        }
        Ok(())
    }

    async fn show_fridge(&self, chat: ChannelId) {
        let orch = &self.orch;
        match orch.fridge.list(chat).await {
            Ok(items) if items.is_empty() => orch.notify(chat, messages::FRIDGE_EMPTY).await,
            Ok(items) => orch.notify(chat, &messages::fridge_contents(&items)).await,
            Err(e) => {
                warn!(channel = %chat, error = %e, "failed to list fridge");
                orch.notify(chat, messages::FRIDGE_LIST_UNAVAILABLE).await;
            }
        }
    }

    async fn on_add(&self, chat: ChannelId, args: &str) -> Result<(), SupperError> {
        let orch = &self.orch;
        if args.is_empty() {
            orch.notify(chat, messages::ADD_USAGE).await;
            return Ok(());
        }
        let progress = orch.send(chat, messages::PROCESSING_INGREDIENTS).await.ok();

        let parsed = match orch.llm_call(orch.llm.parse_ingredients(args)).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(channel = %chat, error = %e, "ingredient parsing failed");
                orch.replace(chat, progress, messages::PARSE_FAILED).await;
                return Ok(());
            }
        };
        let added = orch.fridge.add(chat, &parsed).await?;
        if added.is_empty() {
            orch.replace(chat, progress, messages::NO_INGREDIENTS_FOUND).await;
            return Ok(());
        }
        orch.replace(chat, progress, &messages::ingredients_added(&added)).await;

        let items = orch.fridge.list(chat).await?;
        if items.is_empty() {
            orch.notify(chat, messages::FRIDGE_STILL_EMPTY).await;
        } else {
            orch.notify(chat, &messages::fridge_now(&items)).await;
        }
        Ok(())
    }

    async fn on_suggest(&self, chat: ChannelId, from: &Sender, args: &str) -> Result<(), SupperError> {
        let orch = &self.orch;
        if args.is_empty() {
            orch.sessions.set_mode(chat, ChatMode::AwaitingSuggestion);
            orch.notify(chat, messages::SUGGEST_USAGE).await;
            return Ok(());
        }
        let progress = orch.send(chat, &messages::looking_up(args)).await.ok();

        let info = match orch.llm_call(orch.llm.dish_info(args, None)).await {
            Ok(info) => info,
            Err(e) => {
                warn!(channel = %chat, dish = args, error = %e, "dish lookup failed");
                orch.replace(chat, progress, &messages::lookup_failed(args)).await;
                return Ok(());
            }
        };
        let name = if info.name.trim().is_empty() {
            args
        } else {
            info.name.as_str()
        };

        let missing = match orch.fridge.get(chat).await {
            Ok(fridge) if !fridge.ingredients.is_empty() => {
                compare_ingredients(&info.ingredients_needed, &fridge.names())
            }
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!(channel = %chat, error = %e, "fridge unavailable, skipping comparison");
                Vec::new()
            }
        };

        let suggestion = match orch
            .suggestions
            .add(chat, from, name, &info.cuisine, &info.description)
            .await
        {
            Ok(suggestion) => suggestion,
            Err(e) => {
                warn!(channel = %chat, error = %e, "failed to store suggestion");
                orch.replace(chat, progress, &messages::suggestion_save_failed(args)).await;
                return Ok(());
            }
        };
        orch.replace(
            chat,
            progress,
            &messages::suggestion_saved(&suggestion, &info.ingredients_needed, &missing),
        )
        .await;
        Ok(())
    }

    async fn on_cuisines(&self, chat: ChannelId, args: &str) -> Result<(), SupperError> {
        let orch = &self.orch;
        if args.is_empty() {
            let state = orch.channels.ensure(chat).await?;
            orch.notify(chat, &messages::cuisines(&state.cuisines)).await;
            return Ok(());
        }
        let list: Vec<String> = args.split(',').map(str::to_string).collect();
        match orch.channels.set_cuisines(chat, list).await {
            Ok(set) => orch.notify(chat, &messages::cuisines_updated(&set)).await,
            Err(SupperError::InvalidInput(_)) => orch.notify(chat, messages::CUISINES_USAGE).await,
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn on_photo(&self, chat: ChannelId, file_id: &str) -> Result<(), SupperError> {
        let orch = &self.orch;
        let mode = orch.sessions.mode(chat);
        if !matches!(mode, ChatMode::AwaitingIngredients | ChatMode::AwaitingPhotos) {
            orch.notify(chat, messages::PHOTO_WITHOUT_MODE).await;
            return Ok(());
        }

        let progress = orch.send(chat, messages::PROCESSING_PHOTO).await.ok();
        let bytes = match with_timeout(orch.settings.transport_timeout, orch.transport.download_file(file_id)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(channel = %chat, error = %e, "failed to download photo");
                orch.notify(chat, messages::PHOTO_FAILED).await;
                return Ok(());
            }
        };
        let image = jpeg_data_url(&bytes);
        let found = match orch.llm_call(orch.llm.extract_ingredients_from_image(&image)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(channel = %chat, error = %e, "ingredient extraction failed");
                orch.notify(chat, messages::PHOTO_EXTRACT_FAILED).await;
                return Ok(());
            }
        };
        let added = orch.fridge.add(chat, &found).await?;
        if added.is_empty() {
            orch.notify(chat, messages::PHOTO_NOTHING_FOUND).await;
            return Ok(());
        }
        orch.replace(chat, progress, &messages::photo_ingredients(&added)).await;

        // Keep the session alive while photos keep coming.
        orch.sessions.set_mode(chat, mode);
        match mode {
            ChatMode::AwaitingIngredients => {
                orch.notify_keyboard(chat, messages::MORE_OR_DONE, callbacks::more_or_done_keyboard())
                    .await;
            }
            _ => {
                orch.notify_keyboard(chat, messages::MORE_PHOTOS, callbacks::done_photos_keyboard())
                    .await;
            }
        }
        Ok(())
    }

    async fn on_text(&self, chat: ChannelId, text: &str) -> Result<(), SupperError> {
        let orch = &self.orch;
        match orch.sessions.mode(chat) {
            ChatMode::AwaitingIngredients => {
                let parsed = match orch.llm_call(orch.llm.parse_ingredients(text)).await {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(channel = %chat, error = %e, "ingredient parsing failed");
                        orch.notify(chat, messages::PARSE_FAILED).await;
                        return Ok(());
                    }
                };
                let added = orch.fridge.add(chat, &parsed).await?;
                if added.is_empty() {
                    orch.notify(chat, messages::NO_INGREDIENTS_FOUND).await;
                    return Ok(());
                }
                orch.sessions.set_mode(chat, ChatMode::AwaitingIngredients);
                orch.notify(chat, &messages::ingredients_added(&added)).await;
                orch.notify_keyboard(chat, messages::MORE_OR_DONE, callbacks::more_or_done_keyboard())
                    .await;
            }
            ChatMode::AwaitingSuggestion => {
                orch.sessions.clear(chat);
                orch.notify(chat, messages::SUGGEST_VIA_COMMAND).await;
            }
            ChatMode::Normal | ChatMode::AwaitingPhotos => {
                if text.contains(' ') || text.chars().count() >= SINGLE_INGREDIENT_MAX_CHARS {
                    return Ok(());
                }
                match orch.fridge.add(chat, &[text.to_string()]).await {
                    Ok(_) => orch.notify(chat, &messages::single_ingredient_added(text)).await,
                    Err(e) => {
                        warn!(channel = %chat, error = %e, "failed to add ingredient");
                        orch.notify(chat, &messages::single_ingredient_failed(text)).await;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Splits `/cmd@bot rest` into `("cmd", "rest")`.
fn parse_command(text: &str) -> Option<(String, &str)> {
    let body = text.strip_prefix('/')?;
    let (head, args) = match body.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (body, ""),
    };
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), args))
}

/// Telegram re-encodes every photo as JPEG.
fn jpeg_data_url(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
}
