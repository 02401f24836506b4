/// Sanitizes user-supplied post details and comments before they are stored.
///
/// Whitelist-based: safe inline markup (<b>, <p>, links) survives, while
/// <script>, <iframe> and event-handler attributes are stripped. Surrounding
/// whitespace is trimmed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input.trim())
}
