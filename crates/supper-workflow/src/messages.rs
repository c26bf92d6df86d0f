// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing chat texts. Markdown uses Telegram's legacy flavour.

use crate::models::{DinnerRecord, Ingredient, UserSuggestion};
use supper_core::{DishInfo, DishSuggestion};

use crate::vote::Quorum;

pub const POLL_QUESTION: &str = "What should we cook tonight?";

pub const DINNER_TIME: &str = "🕒 It's dinner time! Let me suggest some options based on your fridge...";
pub const FRIDGE_UNAVAILABLE: &str = "😢 Sorry, I couldn't retrieve your fridge contents. Please try again later or use the /dinner command manually.";
pub const FRIDGE_EMPTY_FOR_DINNER: &str = "😢 Your fridge is empty! Please add some ingredients with /sync_fridge or /add_photo before I can suggest dinner options.";
pub const THINKING: &str = "🧐 Thinking about dinner options based on your ingredients... This might take a moment.";
pub const SUGGESTIONS_FAILED: &str = "😢 Sorry, I couldn't come up with dinner suggestions right now. Please try again later or use the /dinner command manually.";
pub const NO_SUGGESTIONS: &str = "😢 I couldn't find any suitable dishes based on your fridge contents. Try adding more ingredients with /fridge or suggest your own dishes with /suggest.";
pub const POLL_FAILED: &str = "😢 Sorry, I couldn't create a poll for dinner options. Please try again later or use the /dinner command manually.";
pub const ALREADY_PLANNING: &str = "🍽️ Dinner planning is already underway in this chat. Finish the current poll or dinner first.";

pub const POLL_CLOSED_LATE: &str = "⏰ It's getting late! The dinner poll has been closed automatically.";
pub const NOBODY_VOTED: &str = "😢 Nobody voted for dinner today.";
pub const DINNER_CLOSED_LATE: &str = "⏰ It's getting late! The dinner has been marked as finished automatically.";
pub const NO_VOLUNTEER: &str = "⏰ 15 minutes have passed and nobody volunteered to cook. Let's try again with a new poll!";

pub const VOLUNTEER_BUTTON: &str = "I'll cook!";
pub const THANKS_FOR_VOLUNTEERING: &str = "Thanks for volunteering to cook!";
pub const NOT_ELIGIBLE_TO_COOK: &str = "Only people who voted for the winning dish can volunteer.";
pub const DINNER_READY_BUTTON: &str = "🍽️ Dinner is ready!";
pub const ONLY_COOK_CAN_FINISH: &str = "Only the cook can mark dinner as ready.";
pub const DINNER_READY_ANSWER: &str = "Dinner is ready!";
pub const DINNER_READY_SUFFIX: &str = "\n\n✅ Dinner is ready!";
pub const RATE_PROMPT: &str = "How would you rate tonight's dinner? Your feedback helps improve future suggestions!";
pub const INVALID_RATING: &str = "Invalid rating. Please try again.";
pub const UPDATE_FRIDGE_PROMPT: &str = "Would you like to update your fridge by removing the ingredients used for this dinner?";
pub const UPDATE_FRIDGE_YES: &str = "Yes, update fridge";
pub const UPDATE_FRIDGE_NO: &str = "No, keep as is";
pub const FRIDGE_UPDATED_ANSWER: &str = "Fridge updated!";
pub const FRIDGE_UPDATED: &str = "✅ Your fridge has been updated by removing the ingredients used for this dinner.";
pub const FRIDGE_NOW_EMPTY: &str = "Your fridge is now empty! You might want to add more ingredients with /sync_fridge or /add_photo.";
pub const FRIDGE_NOT_UPDATED_ANSWER: &str = "Fridge not updated.";
pub const FRIDGE_NOT_UPDATED: &str = "Fridge not updated. Your ingredients remain the same.";
pub const EXPIRED_BUTTON: &str = "This button has expired.";
pub const TRY_AGAIN: &str = "Something went wrong. Please try again.";
pub const GENERIC_ERROR: &str = "😢 Sorry, something went wrong. Please try again later.";

pub const FRIDGE_EMPTY: &str = "Your fridge is empty! Add ingredients with /sync_fridge or by sending a photo with /add_photo.";
pub const FRIDGE_LIST_UNAVAILABLE: &str = "😢 Sorry, I couldn't retrieve your fridge contents right now. Please try again later.";
pub const FRIDGE_RESET: &str = "🧹 Fridge reset! Now, please send me a list of ingredients you have. You can send multiple messages, and I'll add all the ingredients to your fridge.";
pub const ADD_USAGE: &str = "🍎 Please provide a list of ingredients to add to your fridge. For example: /add eggs, milk, bread";
pub const PROCESSING_INGREDIENTS: &str = "🔍 Processing your ingredients... This might take a moment.";
pub const PARSE_FAILED: &str = "😢 Sorry, I couldn't understand the ingredients. Please try again with a clearer list.";
pub const NO_INGREDIENTS_FOUND: &str = "I couldn't find any ingredients in your message. Please try again with a list of ingredients.";
pub const MORE_OR_DONE: &str = "Would you like to add more ingredients or are you done?";
pub const DONE_ADDING_BUTTON: &str = "Done adding ingredients";
pub const ADD_MORE_BUTTON: &str = "Add more";
pub const DONE_ADDING_ANSWER: &str = "Thanks! Your fridge is now updated.";
pub const DONE_ADDING: &str = "✅ Fridge update complete! Use /fridge to see your ingredients or /dinner to get dinner suggestions.";
pub const ADD_MORE_ANSWER: &str = "Please send more ingredients!";
pub const ADD_MORE: &str = "Please send more ingredients. I'll add them to your fridge.";

pub const SEND_PHOTOS: &str = "📷 Please send photos of your fridge or pantry, and I'll extract ingredients from them. Send as many photos as you need, and I'll process each one. Press 'Cancel' if you want to stop.";
pub const CANCEL_BUTTON: &str = "Cancel";
pub const PROCESSING_PHOTO: &str = "🔍 Processing your photo... This might take a moment.";
pub const PHOTO_FAILED: &str = "😢 Sorry, I couldn't process your photo. Please try again.";
pub const PHOTO_EXTRACT_FAILED: &str = "😢 Sorry, I couldn't identify any ingredients in your photo. Please try again with a clearer photo.";
pub const PHOTO_NOTHING_FOUND: &str = "I couldn't identify any ingredients in your photo. Please try again with a clearer photo.";
pub const MORE_PHOTOS: &str = "Send more photos of your fridge or pantry, and I'll extract ingredients from them. Press 'Done' when you're finished.";
pub const DONE_PHOTOS_BUTTON: &str = "Done adding photos";
pub const DONE_PHOTOS_ANSWER: &str = "Thanks! Your fridge is now updated with ingredients from your photos.";
pub const DONE_PHOTOS: &str = "✅ Photo processing complete! I've added all the ingredients I found to your fridge.";
pub const PHOTOS_CANCELLED_ANSWER: &str = "Photo adding cancelled.";
pub const PHOTOS_CANCELLED: &str = "Photo adding cancelled. You can use /fridge to see your current ingredients or /dinner to get dinner suggestions.";
pub const FRIDGE_STILL_EMPTY: &str = "Your fridge is still empty. Try adding ingredients with text or better photos.";
pub const NEXT_STEP_DINNER: &str = "You can now use /dinner to get dinner suggestions based on your ingredients!";
pub const PHOTO_WITHOUT_MODE: &str = "I see you sent a photo! If you want me to extract ingredients from it, please use the /add_photo command.";

pub const SUGGEST_USAGE: &str = "🍴 You can suggest a dish for dinner! Please use the command like this: /suggest Lasagna";
pub const SUGGEST_VIA_COMMAND: &str = "🍴 Please use the /suggest command followed by a dish name, like: /suggest Lasagna";
pub const CUISINES_USAGE: &str = "Use /cuisines Italian, Thai, Mexican to change them.";
pub const CANCELLED: &str = "👌 Cancelled. Back to normal mode.";

pub fn welcome(agent_name: &str) -> String {
    format!(
        "👋 Welcome to {agent_name} bot! I'll help your family decide what to cook for dinner.\n\n{HELP}"
    )
}

pub const HELP: &str = "Here's what I can do:\n\
/dinner - suggest dishes and start a poll\n\
/fridge - show what's in your fridge\n\
/sync_fridge - reset the fridge and list ingredients\n\
/add eggs, milk - add ingredients\n\
/add_photo - add ingredients from photos\n\
/suggest Lasagna - suggest a dish for the next poll\n\
/cuisines - show or change preferred cuisines\n\
/cancel - stop what you're doing";

pub fn vote_instructions(quorum: Quorum) -> String {
    format!(
        "🗳 Please vote for your preferred dinner option! The poll will close automatically when {}/{} of the channel members have voted.",
        quorum.numerator, quorum.denominator
    )
}

pub fn winning_dish(dish: &str) -> String {
    format!("🏆 The winning dish is *{dish}*.")
}

pub fn poll_closed(dish: &str) -> String {
    format!("🎉 The poll has closed! The winning dish is *{dish}*.")
}

pub fn who_cooks(dish: &str) -> String {
    format!("Who wants to cook *{dish}* tonight? Press the button below to volunteer!")
}

pub fn already_cooking(cook: &str) -> String {
    format!("@{cook} is already cooking tonight!")
}

pub fn volunteered(user: &str, dish: &str) -> String {
    format!("@{user} has volunteered to cook {dish} tonight!")
}

pub fn no_recipe(dish: &str, user: &str) -> String {
    format!("😢 Sorry, I couldn't find cooking instructions for {dish}. @{user}, you're on your own for this one!")
}

pub fn recipe(info: &DishInfo, dish: &str) -> String {
    let mut text = format!("🍳 *Cooking Instructions for {dish}*\n\n");
    if !info.ingredients_needed.is_empty() {
        text.push_str("*Ingredients:*\n");
        for item in &info.ingredients_needed {
            text.push_str(&format!("• {item}\n"));
        }
        text.push('\n');
    }
    if !info.instructions.is_empty() {
        text.push_str("*Instructions:*\n");
        for (i, step) in info.instructions.iter().enumerate() {
            text.push_str(&format!("{}. {step}\n", i + 1));
        }
    }
    text.trim_end().to_string()
}

pub fn dinner_ready(dinner: &DinnerRecord) -> String {
    format!(
        "🍽️ *Dinner is ready!* @{} has prepared {}. Enjoy your meal!",
        dinner.cook_name, dinner.dish.name
    )
}

pub fn rating_thanks_answer(stars: u8) -> String {
    format!("Thanks for rating {stars} stars!")
}

pub fn rating_thanks(user: &str, stars: u8) -> String {
    format!("Thanks for your feedback! @{user} rated tonight's dinner {stars} stars.")
}

pub fn suggestion_list(user: &[UserSuggestion], ai: &[DishSuggestion]) -> String {
    let mut text = String::from("🍲 Here are some dinner suggestions based on your ingredients:\n\n");
    for s in user {
        text.push_str(&format!(
            "🍴 *{}* ({})\n{}\n_Suggested by @{}_\n\n",
            s.name, s.cuisine, s.description, s.username
        ));
    }
    for s in ai {
        text.push_str(&format!("🍴 *{}* ({})\n{}\n\n", s.name, s.cuisine, s.description));
    }
    text
}

fn ingredient_lines(items: &[Ingredient]) -> String {
    items
        .iter()
        .map(|i| match i.quantity.as_deref() {
            Some(q) if !q.is_empty() => format!("• {} ({q})\n", i.name),
            _ => format!("• {}\n", i.name),
        })
        .collect()
}

pub fn fridge_contents(items: &[Ingredient]) -> String {
    format!("🧊 Here's what's in your fridge:\n\n{}", ingredient_lines(items))
}

pub fn fridge_now(items: &[Ingredient]) -> String {
    format!("🧊 Here's what's in your fridge now:\n\n{}", ingredient_lines(items))
}

pub fn fridge_leftovers(items: &[Ingredient]) -> String {
    format!("🧊 Here's what's left in your fridge:\n\n{}", ingredient_lines(items))
}

pub fn ingredients_added(names: &[String]) -> String {
    format!("✅ Added {} ingredients to your fridge: {}", names.len(), names.join(", "))
}

pub fn single_ingredient_added(name: &str) -> String {
    format!("✅ Added {name} to your fridge!")
}

pub fn single_ingredient_failed(name: &str) -> String {
    format!("😢 Sorry, I couldn't add {name} to your fridge.")
}

pub fn photo_ingredients(names: &[String]) -> String {
    format!("✅ I found {} ingredients in your photo: {}", names.len(), names.join(", "))
}

pub fn looking_up(dish: &str) -> String {
    format!("🧐 Looking up information about '{dish}'... This might take a moment.")
}

pub fn lookup_failed(dish: &str) -> String {
    format!("😢 Sorry, I couldn't find information about '{dish}'. Please try again with a different dish.")
}

pub fn suggestion_save_failed(dish: &str) -> String {
    format!("😢 Sorry, I couldn't save your suggestion for '{dish}'. Please try again later.")
}

pub fn suggestion_saved(s: &UserSuggestion, needed: &[String], missing: &[String]) -> String {
    let mut text = format!(
        "✅ Thanks for suggesting *{}* ({} cuisine)!\n\n{}\n\n",
        s.name, s.cuisine, s.description
    );
    if !needed.is_empty() {
        text.push_str("*Ingredients needed:*\n");
        for item in needed {
            text.push_str(&format!("• {item}\n"));
        }
        text.push('\n');
    }
    if !missing.is_empty() {
        text.push_str("*Missing from your fridge:*\n");
        for item in missing {
            text.push_str(&format!("• {item}\n"));
        }
        text.push('\n');
    }
    text.push_str("Your suggestion will be included in future dinner polls.");
    text
}

pub fn cuisines(list: &[String]) -> String {
    format!("🌍 Preferred cuisines: {}\n\n{CUISINES_USAGE}", list.join(", "))
}

pub fn cuisines_updated(list: &[String]) -> String {
    format!("✅ Cuisines updated: {}", list.join(", "))
}
