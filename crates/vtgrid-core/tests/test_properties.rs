//! Property tests for the public entry points: identity laws for plain
//! text, geometry invariance under SGR, and structural invariants under
//! arbitrary byte soup.

use proptest::prelude::*;
use vtgrid_core::{display_width, trim, Emulator, Size, DEFAULT_SIZE};

proptest! {
    // Plain printable ASCII with no trailing blank renders as itself on a
    // single row
    #[test]
    fn plain_ascii_is_identity(text in "[ -~]{0,79}[!-~]") {
        let size = display_width(text.as_bytes()).unwrap();
        prop_assert_eq!(size, Size::new(text.len() as u16, 1));

        let lines = trim(text.as_bytes()).unwrap();
        prop_assert_eq!(lines, vec![text]);
    }

    // Colors never change geometry
    #[test]
    fn sgr_preserves_geometry(text in "[!-~]{1,60}") {
        let wrapped = format!("\x1b[30;41m{}\x1b[0m", text);
        prop_assert_eq!(
            display_width(wrapped.as_bytes()).unwrap(),
            display_width(text.as_bytes()).unwrap()
        );
    }

    // Trimmed rows never exceed the display width and never keep trailing
    // blanks, whatever the input
    #[test]
    fn trimmed_lines_are_bounded(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let lines = trim(&bytes).unwrap();
        for line in lines {
            prop_assert!(!line.ends_with(' '));
            // 132 columns is the widest a fixed display can get (DECCOLM)
            prop_assert!(line.chars().count() <= 132);
        }
    }

    // The cursor stays inside the grid after every byte; the column may sit
    // one past the last cell (pending wrap)
    #[test]
    fn cursor_stays_in_bounds(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut emulator = Emulator::new(DEFAULT_SIZE);
        for byte in bytes {
            emulator.process(&[byte]).unwrap();
            let size = emulator.state().size();
            let cursor = emulator.state().cursor_position();
            prop_assert!(cursor.row < size.rows);
            prop_assert!(cursor.col <= size.cols);
        }
    }

    // After any well-formed sequence the parser is back in its ground
    // state: the next printable character reaches the grid
    #[test]
    fn parser_returns_to_ground(sequence in proptest::sample::select(vec![
        "\x1b[10;10H",
        "\x1b[2J",
        "\x1b[1K",
        "\x1b[1;31;42m",
        "\x1b[?7l",
        "\x1b[?6h",
        "\x1b[5;20r",
        "\x1b[3g",
        "\x1b7",
        "\x1b8",
        "\x1bD",
        "\x1bM",
        "\x1b#8",
        "\x1b#5",
        "\x1b(B",
        "\x1b)0",
    ])) {
        let input = format!("{}Z", sequence);
        let lines = trim(input.as_bytes()).unwrap();
        let rendered: String = lines.concat();
        prop_assert!(rendered.contains('Z'));
    }
}
