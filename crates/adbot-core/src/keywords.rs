use crate::CoreError;

/// Keyword choices offered to operators.
pub const KEYWORD_PRESETS: &[&str] = &[
    "Аренда офиса",
    "Продажа офиса",
    "Офис",
    "Коммерческая недвижимость",
    "Сдача офиса",
    "Продажа коммерческой недвижимости",
    "Офисные помещения",
    "Коммерческие помещения",
];

/// Resolves operator input against [`KEYWORD_PRESETS`].
///
/// A purely numeric entry is read as a 1-based preset index; anything else is
/// passed through as a free-form keyword.
///
/// # Errors
///
/// Returns [`CoreError::UnknownKeywordPreset`] when the input names a preset
/// index that does not exist.
pub fn resolve_keyword(input: &str) -> Result<String, CoreError> {
    let trimmed = input.trim();
    match trimmed.parse::<usize>() {
        Ok(idx) => idx
            .checked_sub(1)
            .and_then(|i| KEYWORD_PRESETS.get(i))
            .map(|k| (*k).to_owned())
            .ok_or_else(|| CoreError::UnknownKeywordPreset(trimmed.to_owned())),
        Err(_) => Ok(trimmed.to_owned()),
    }
}
