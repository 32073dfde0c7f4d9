use anyhow::{anyhow, bail, Context, Result};
use client_core::SliderLayout;
use shared::domain::{ButtonId, ChannelId, VarName};

pub const HELP: &str = "\
commands:
  press <button>        e.g. press bAUTO
  toggle <channel>      e.g. toggle 12
  tune <channel> <v>    e.g. tune 5 7.3
  set <name> <v>        e.g. set tSET 22.5
  show                  print the whole panel
  sliders               print slider ranges and ticks
  help
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Press(ButtonId),
    Toggle(ChannelId),
    Tune(ChannelId, f64),
    Set(VarName, f64),
    Show,
    Sliders,
    Help,
    Quit,
}

/// Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("press", [button]) => Command::Press(ButtonId::new(*button)),
        ("toggle", [channel]) => Command::Toggle(ChannelId::new(*channel)),
        ("tune", [channel, value]) => Command::Tune(ChannelId::new(*channel), parse_value(value)?),
        ("set", [name, value]) => Command::Set(VarName::new(*name), parse_value(value)?),
        ("show", []) => Command::Show,
        ("sliders", []) => Command::Sliders,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        ("press" | "toggle" | "tune" | "set" | "show" | "sliders" | "help" | "quit", _) => {
            bail!("wrong number of arguments for '{verb}'")
        }
        _ => return Err(anyhow!("unknown command '{verb}' (try 'help')")),
    };
    Ok(Some(command))
}

fn parse_value(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .with_context(|| format!("'{raw}' is not a number"))
}

/// Holds a typed value to the range of the slider for `id`, the way the
/// slider itself would. Controls without a slider pass through.
pub fn clamp_to_slider(sliders: &[SliderLayout], id: &str, raw: f64) -> f64 {
    sliders
        .iter()
        .find(|layout| layout.id.as_str() == id)
        .map_or(raw, |layout| layout.clamp(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_intent_command() {
        assert_eq!(
            parse_command("press bAUTO").expect("press"),
            Some(Command::Press("bAUTO".into()))
        );
        assert_eq!(
            parse_command("  toggle 12 ").expect("toggle"),
            Some(Command::Toggle("12".into()))
        );
        assert_eq!(
            parse_command("tune 5 7.3").expect("tune"),
            Some(Command::Tune("5".into(), 7.3))
        );
        assert_eq!(
            parse_command("SET tSET 22.5").expect("set"),
            Some(Command::Set("tSET".into(), 22.5))
        );
        assert_eq!(parse_command("").expect("blank"), None);
        assert_eq!(parse_command("quit").expect("quit"), Some(Command::Quit));
    }

    #[test]
    fn typed_values_stay_inside_the_slider_range() {
        let sliders = client_core::slider_layouts(&client_core::PanelConfig::default());
        assert_eq!(clamp_to_slider(&sliders, "15", 50.0), 35.0);
        assert_eq!(clamp_to_slider(&sliders, "15", 1.0), 5.0);
        assert_eq!(clamp_to_slider(&sliders, "tSET", 22.5), 22.5);
        assert_eq!(clamp_to_slider(&sliders, "99", 1e9), 1e9);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("tune 5").is_err());
        assert!(parse_command("tune 5 warm").is_err());
        assert!(parse_command("launch").is_err());
    }
}
