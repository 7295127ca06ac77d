//! The key bindings reel ships with.

use crate::binding::Binding;
use crate::conf::parse_line;

const DEFAULT_CONF: &str = r#"# reel default key bindings.
# Copy the lines you want to change into your own input.conf; the user
# file always wins over these defaults.

# Playback
SPACE cycle pause
p cycle pause
. frame-step
, frame-back-step
BS set speed 1.0   # reset playback speed
[ multiply speed 0.9091
] multiply speed 1.1

# Seeking
RIGHT seek 5
LEFT seek -5
UP seek 60
DOWN seek -60
Shift+RIGHT seek 1 exact
Shift+LEFT seek -1 exact
PGUP add chapter 1
PGDWN add chapter -1

# Playlist
> playlist-next
< playlist-prev

# Volume
0 add volume 2
9 add volume -2
m cycle mute
Ctrl++ add audio-delay 0.100
Ctrl+- add audio-delay -0.100

# Display
f cycle fullscreen
o show-progress
s screenshot
S screenshot video

# Subtitles
v cycle sub-visibility
j cycle sub
J cycle sub down

# Quit
q quit
Q quit-watch-later   # remember the playback position

# Commands the stock grammar does not know yet ship behind the
# extended prefix so older builds skip them as comments.
#@reel F8 playlist-shuffle
#@reel F9 extension-browser
"#;

/// The bindings applied when the user has no input.conf yet, in the same
/// grammar the file uses. The editor writes this text out verbatim to seed
/// a new user file.
pub fn default_conf_text() -> &'static str {
    DEFAULT_CONF
}

/// The shipped bindings, parsed. Every line is expressible in the file
/// grammar and no two lines contend for a key.
pub fn default_bindings() -> Vec<Binding> {
    DEFAULT_CONF.lines().filter_map(parse_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::{render_line, ConfAccess, ConfFile};
    use crate::resolver::resolve;
    use std::collections::HashSet;

    #[test]
    fn test_preset_parses() {
        let bindings = default_bindings();
        assert!(bindings.len() > 20);
        assert!(bindings.iter().any(|b| b.extended_command));
        assert!(bindings.iter().any(|b| b.comment.is_some()));
    }

    #[test]
    fn test_preset_round_trips() {
        for binding in default_bindings() {
            let rendered = render_line(&binding);
            let reparsed = parse_line(&rendered)
                .unwrap_or_else(|| panic!("{rendered:?} does not parse back"));
            assert_eq!(reparsed.raw_key, binding.raw_key);
            assert_eq!(reparsed.action, binding.action);
            assert_eq!(reparsed.comment, binding.comment);
            assert_eq!(reparsed.extended_command, binding.extended_command);
        }
    }

    #[test]
    fn test_preset_has_no_conflicts() {
        let bindings = default_bindings();
        let total = bindings.len();

        let keys: HashSet<String> = bindings.iter().map(Binding::normalized_key).collect();
        assert_eq!(keys.len(), total);

        let resolved = resolve(bindings);
        for row in &resolved.annotated {
            assert!(row.enabled, "{} is disabled: {:?}", row.binding, row.status);
        }
        assert_eq!(resolved.enabled.len(), total);
    }

    #[test]
    fn test_preset_loads_as_conf_file() {
        let store =
            ConfFile::from_text("defaults", default_conf_text(), ConfAccess::ReadOnly).unwrap();
        assert_eq!(store.bindings().len(), default_bindings().len());
    }
}
