//! Freedesktop `.desktop` entry parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fields of a `[Desktop Entry]` group relevant to the launcher.
pub struct DesktopEntry {
    /// Unlocalized `Name=`.
    pub name: String,
    /// Raw `Exec=` line, field codes included.
    pub exec: Option<String>,
    /// `Icon=` value: an absolute path or a themed icon name.
    pub icon: Option<String>,
    /// `NoDisplay=true`: installed but hidden from menus.
    pub no_display: bool,
    /// `Hidden=true`: treated as deleted.
    pub hidden: bool,
}

impl DesktopEntry {
    /// Returns whether the entry can be started from a launcher.
    pub fn is_launchable(&self) -> bool {
        !self.no_display && self.command_args().is_some()
    }

    /// Returns the `Exec=` arguments with field codes removed.
    ///
    /// Quoting follows shell word rules, so `"/opt/My App/run" %U` yields one program argument.
    /// Returns `None` for an empty line or unbalanced quotes.
    pub fn command_args(&self) -> Option<Vec<String>> {
        let words = shell_words::split(self.exec.as_deref()?).ok()?;
        let args = words
            .iter()
            .map(|word| remove_field_codes(word))
            .filter(|arg| !arg.is_empty())
            .collect::<Vec<_>>();
        (!args.is_empty()).then_some(args)
    }

    /// Returns the field-code-free command line, re-quoted so it splits back into
    /// [`DesktopEntry::command_args`].
    pub fn command_line(&self) -> Option<String> {
        self.command_args().map(shell_words::join)
    }
}

fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Parses the `[Desktop Entry]` group of `content`.
///
/// Returns `None` when the group is missing, has no `Name=`, or is not `Type=Application`.
/// Localized keys (`Name[de]=`) and other groups are ignored.
pub fn parse_desktop_entry(content: &str) -> Option<DesktopEntry> {
    let mut in_group = false;
    let mut name = None;
    let mut exec = None;
    let mut icon = None;
    let mut kind = None;
    let mut no_display = false;
    let mut hidden = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with('[') {
            in_group = trimmed == "[Desktop Entry]";
            continue;
        }
        if !in_group {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(value.to_string()),
            "Exec" => exec = Some(value.to_string()),
            "Icon" if !value.is_empty() => icon = Some(value.to_string()),
            "Type" => kind = Some(value.to_string()),
            "NoDisplay" => no_display = parse_bool(value),
            "Hidden" => hidden = parse_bool(value),
            _ => {}
        }
    }

    if kind.as_deref() != Some("Application") {
        return None;
    }
    Some(DesktopEntry {
        name: name.filter(|name| !name.is_empty())?,
        exec,
        icon,
        no_display,
        hidden,
    })
}

fn remove_field_codes(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut chars = word.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        if let Some('%') = chars.next() {
            out.push('%');
        }
    }
    out
}

/// Removes `%f`-style field codes from an `Exec=` line; `%%` becomes a literal `%`.
pub fn strip_field_codes(exec: &str) -> String {
    remove_field_codes(exec)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
