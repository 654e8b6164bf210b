use url::Url;

/// Sets campaign tracking parameters on a link.
///
/// `defaults` are applied first and `overrides` win over them; any existing value for
/// the same key is replaced, other query parameters are kept in order. Relative or
/// unparsable links are returned unchanged.
pub fn add_utm(link: &str, defaults: &[(String, String)], overrides: &[(&str, &str)]) -> String {
    let Ok(mut url) = Url::parse(link) else {
        return link.to_string();
    };

    let mut params: Vec<(String, String)> = defaults.to_vec();
    for (key, value) in overrides {
        match params.iter_mut().find(|(existing, _)| existing == key) {
            Some(slot) => slot.1 = (*value).to_string(),
            None => params.push(((*key).to_string(), (*value).to_string())),
        }
    }
    if params.is_empty() {
        return link.to_string();
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !params.iter().any(|(name, _)| name == key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    url.to_string()
}
