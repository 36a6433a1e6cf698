use std::borrow::Cow;

/// Renders an optional error context as ` (context)` for `Display` impls.
pub(crate) fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
