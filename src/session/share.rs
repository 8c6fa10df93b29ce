use url::Url;

use crate::composition::format::FormatKey;
use crate::composition::scene::BackgroundMode;
use crate::foundation::core::parse_token;
use crate::session::state::EditingState;

/// Editing state as carried by a share link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedState {
    /// `None` when the link names an unknown format.
    pub format: Option<FormatKey>,
    /// `None` when `t` is absent or blank.
    pub token: Option<u32>,
    pub background: BackgroundMode,
    pub custom_file: Option<String>,
    pub overlay: bool,
}

fn flag(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

/// Share link for `state`: `base` with its query replaced by `fmt, t, uc, cb, nb, gmc`.
///
/// `cb` always carries the active format's selection so it survives a round trip in any mode.
pub fn encode_share_url(base: &Url, state: &EditingState) -> Url {
    let mut url = base.clone();
    url.set_fragment(None);
    {
        let mut q = url.query_pairs_mut();
        q.clear();
        q.append_pair("fmt", state.format.as_str());
        q.append_pair("t", &state.token.to_string());
        q.append_pair("uc", flag(state.background == BackgroundMode::Custom));
        q.append_pair("cb", state.custom_for(state.format));
        q.append_pair("nb", flag(state.background == BackgroundMode::Disabled));
        q.append_pair("gmc", flag(state.overlay));
    }
    url
}

/// Read share parameters from `url`. Links carrying neither `fmt` nor `t` yield `None`.
pub fn decode_share_url(url: &Url) -> Option<SharedState> {
    let mut fmt = None;
    let mut t = None;
    let (mut uc, mut nb, mut gmc) = (false, false, false);
    let mut cb = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "fmt" => fmt = Some(v.into_owned()),
            "t" => t = Some(v.into_owned()),
            "uc" => uc = v == "1",
            "nb" => nb = v == "1",
            "gmc" => gmc = v == "1",
            "cb" => cb = Some(v.into_owned()).filter(|s| !s.trim().is_empty()),
            _ => {}
        }
    }
    if fmt.is_none() && t.is_none() {
        return None;
    }

    let background = if nb {
        BackgroundMode::Disabled
    } else if uc {
        BackgroundMode::Custom
    } else {
        BackgroundMode::FromToken
    };
    Some(SharedState {
        format: fmt.and_then(|f| f.parse().ok()),
        token: t
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_token(s.split('-').next().unwrap_or(s))),
        background,
        custom_file: cb,
        overlay: gmc,
    })
}

/// Overlay a decoded link onto `state`.
pub fn apply_shared(state: &mut EditingState, shared: &SharedState) {
    if let Some(format) = shared.format {
        state.format = format;
    }
    if let Some(token) = shared.token {
        state.token = token;
    }
    state.background = shared.background;
    if let Some(file) = &shared.custom_file {
        state.selected_custom.insert(state.format, file.clone());
    }
    state.overlay = shared.overlay;
}

#[cfg(test)]
#[path = "../../tests/unit/session/share.rs"]
mod tests;
