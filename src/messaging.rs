/// Outbound messaging link construction.
///
/// The portal never sends messages itself; it hands the client a deep link
/// that opens an external chat with a pre-filled body. Number and body come
/// from operator-editable portal settings.

/// Setting keys for the chat button.
pub const CHAT_NUMBER_KEY: &str = "whatsapp_number";
pub const CHAT_MESSAGE_KEY: &str = "whatsapp_message";

/// chat_link
///
/// Builds a `wa.me` deep link. The destination is reduced to bare digits
/// (operators paste numbers with `+`, spaces and dashes in every imaginable
/// format); the body is percent-encoded verbatim.
pub fn chat_link(number: &str, message: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if message.is_empty() {
        format!("https://wa.me/{digits}")
    } else {
        format!("https://wa.me/{digits}?text={}", urlencoding::encode(message))
    }
}
