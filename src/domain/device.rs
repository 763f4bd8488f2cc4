//! User-agent enrichment
//!
//! Turns a raw `User-Agent` header into coarse browser / OS / device
//! descriptors. Matching is token based and order sensitive: browsers that
//! embed other browsers' tokens (Edge and Opera carry `Chrome/`, Chrome carries
//! `Safari/`) are checked first, and iOS is checked before macOS because
//! iPhone agents contain `like Mac OS X`.

/// Shown for any descriptor the agent string did not reveal
pub const UNKNOWN_PLACEHOLDER: &str = "неизвестно";

/// Agents longer than this are truncated before matching
const MAX_USER_AGENT_CHARS: usize = 512;

/// Derived view of a visitor's user agent. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub device_descriptor: Option<String>,
}

impl DeviceInfo {
    /// Browser name and version, or the placeholder
    pub fn browser(&self) -> String {
        join_name_version(self.browser_name.as_deref(), self.browser_version.as_deref())
    }

    /// OS name and version, or the placeholder
    pub fn os(&self) -> String {
        join_name_version(self.os_name.as_deref(), self.os_version.as_deref())
    }

    pub fn device(&self) -> &str {
        self.device_descriptor.as_deref().unwrap_or(UNKNOWN_PLACEHOLDER)
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}

fn join_name_version(name: Option<&str>, version: Option<&str>) -> String {
    match (name, version) {
        (Some(name), Some(version)) => format!("{name} {version}"),
        (Some(name), None) => name.to_string(),
        (None, _) => UNKNOWN_PLACEHOLDER.to_string(),
    }
}

/// Coarse device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceKind {
    Desktop,
    Phone,
    Tablet,
    Bot,
}

impl DeviceKind {
    fn label(self) -> &'static str {
        match self {
            DeviceKind::Desktop => "Компьютер",
            DeviceKind::Phone => "Смартфон",
            DeviceKind::Tablet => "Планшет",
            DeviceKind::Bot => "Бот",
        }
    }
}

/// Parse a raw user agent. Never fails: absent, empty or unrecognised input
/// yields a `DeviceInfo` whose fields are all `None`.
pub fn enrich(raw_user_agent: Option<&str>) -> DeviceInfo {
    let Some(raw) = raw_user_agent else {
        return DeviceInfo::default();
    };

    let ua: String = raw.chars().take(MAX_USER_AGENT_CHARS).collect();
    let ua = ua.trim();
    if ua.is_empty() {
        return DeviceInfo::default();
    }

    let (browser_name, browser_version) = match detect_browser(ua) {
        Some((name, version)) => (Some(name.to_string()), version),
        None => (None, None),
    };
    let (os_name, os_version) = match detect_os(ua) {
        Some((name, version)) => (Some(name.to_string()), version),
        None => (None, None),
    };

    DeviceInfo {
        browser_name,
        browser_version,
        os_name,
        os_version,
        device_descriptor: detect_device(ua),
    }
}

/// Version digits following `token` (e.g. `Chrome/` → `120.0.6099.129`)
fn version_after(ua: &str, token: &str) -> Option<String> {
    let start = ua.find(token)? + token.len();
    let version: String = ua[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '_')
        .collect();
    let version = version.trim_matches(|c| c == '.' || c == '_').replace('_', ".");
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}

fn detect_browser(ua: &str) -> Option<(&'static str, Option<String>)> {
    // (token that identifies the browser, display name, token carrying the version)
    const BROWSERS: &[(&str, &str, &str)] = &[
        ("EdgA/", "Edge", "EdgA/"),
        ("EdgiOS/", "Edge", "EdgiOS/"),
        ("Edg/", "Edge", "Edg/"),
        ("OPR/", "Opera", "OPR/"),
        ("YaBrowser/", "Яндекс Браузер", "YaBrowser/"),
        ("SamsungBrowser/", "Samsung Internet", "SamsungBrowser/"),
        ("Telegram", "Telegram", "Telegram-Android/"),
        ("Instagram", "Instagram", "Instagram "),
        ("FxiOS/", "Firefox", "FxiOS/"),
        ("Firefox/", "Firefox", "Firefox/"),
        ("CriOS/", "Chrome", "CriOS/"),
        ("Chrome/", "Chrome", "Chrome/"),
        ("Trident/", "Internet Explorer", "rv:"),
        ("MSIE ", "Internet Explorer", "MSIE "),
        ("curl/", "curl", "curl/"),
    ];

    for (marker, name, version_token) in BROWSERS {
        if ua.contains(marker) {
            return Some((name, version_after(ua, version_token)));
        }
    }

    // Safari last: nearly every WebKit/Blink agent carries the Safari token
    if ua.contains("Safari/") && ua.contains("Version/") {
        return Some(("Safari", version_after(ua, "Version/")));
    }

    None
}

fn detect_os(ua: &str) -> Option<(&'static str, Option<String>)> {
    if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod") {
        let version = version_after(ua, "iPhone OS ").or_else(|| version_after(ua, "CPU OS "));
        return Some(("iOS", version));
    }
    if ua.contains("Android") {
        return Some(("Android", version_after(ua, "Android ")));
    }
    if let Some(nt) = version_after(ua, "Windows NT ") {
        let name = match nt.as_str() {
            "10.0" => "10",
            "6.3" => "8.1",
            "6.2" => "8",
            "6.1" => "7",
            "6.0" => "Vista",
            "5.1" | "5.2" => "XP",
            _ => return Some(("Windows", Some(format!("NT {nt}")))),
        };
        return Some(("Windows", Some(name.to_string())));
    }
    if ua.contains("Windows") {
        return Some(("Windows", None));
    }
    if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        return Some(("macOS", version_after(ua, "Mac OS X ")));
    }
    if ua.contains("CrOS") {
        return Some(("ChromeOS", None));
    }
    if ua.contains("Linux") || ua.contains("X11") {
        return Some(("Linux", None));
    }
    None
}

fn detect_kind(ua: &str) -> Option<DeviceKind> {
    let lower = ua.to_ascii_lowercase();
    if lower.contains("bot") || lower.contains("spider") || lower.starts_with("curl/") {
        return Some(DeviceKind::Bot);
    }
    if ua.contains("iPad") || ua.contains("Tablet") {
        return Some(DeviceKind::Tablet);
    }
    if ua.contains("iPhone") || ua.contains("iPod") || ua.contains("Mobile") {
        return Some(DeviceKind::Phone);
    }
    if ua.contains("Android") {
        // Android agents without the Mobile token are tablets
        return Some(DeviceKind::Tablet);
    }
    if ua.contains("Windows") || ua.contains("Macintosh") || ua.contains("X11") || ua.contains("CrOS")
    {
        return Some(DeviceKind::Desktop);
    }
    None
}

/// Model name from the Android platform segment, e.g.
/// `(Linux; Android 14; SM-S918B)` → `SM-S918B`
fn android_model(ua: &str) -> Option<String> {
    let start = ua.find('(')? + 1;
    let end = start + ua[start..].find(')')?;
    ua[start..end]
        .split(';')
        .map(str::trim)
        .skip_while(|part| !part.starts_with("Android"))
        .nth(1)
        .map(|part| part.split(" Build/").next().unwrap_or(part).trim())
        .filter(|model| !model.is_empty() && *model != "K" && *model != "wv")
        .map(str::to_string)
}

fn detect_device(ua: &str) -> Option<String> {
    let kind = detect_kind(ua)?;
    let model = if ua.contains("iPhone") {
        Some("iPhone".to_string())
    } else if ua.contains("iPad") {
        Some("iPad".to_string())
    } else if ua.contains("Android") {
        android_model(ua)
    } else {
        None
    };

    Some(match model {
        Some(model) => format!("{} ({model})", kind.label()),
        None => kind.label().to_string(),
    })
}
