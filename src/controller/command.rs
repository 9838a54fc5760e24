//! The line-oriented command language of the labelling loop.

use std::str::FromStr;

pub const HELP: &str = "\
Commands (pixel coordinates are in the original image):
  begin X Y            start a box at (X, Y)
  drag X Y             move the opposite corner of the box being drawn
  finish               add the box being drawn with the active class
  box X1 Y1 X2 Y2      draw a whole box in one step
  cancel               drop the box being drawn
  class ID|NAME        set the class for new boxes
  delete N             remove box N (see `list`)
  undo / redo          step back / forward through box edits
  clear                remove every box on this image
  list                 show the boxes on this image
  classes              show the configured classes
  save                 write this image's label file
  next / prev          save, then move to the next / previous image
  goto N               save, then jump to image N
  help                 show this text
  quit                 leave without saving this image
";

/// One parsed line of user input.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Begin { x: f64, y: f64 },
    Drag { x: f64, y: f64 },
    Finish,
    Box { x1: f64, y1: f64, x2: f64, y2: f64 },
    Cancel,
    Class(String),
    /// 1-based box number as shown by `list`.
    Delete(usize),
    Undo,
    Redo,
    Clear,
    List,
    Classes,
    Save,
    Next,
    Prev,
    /// 1-based image number.
    Goto(usize),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Err("empty command".to_string());
        };
        let args: Vec<&str> = tokens.collect();
        let keyword = keyword.to_ascii_lowercase();

        let command = match keyword.as_str() {
            "begin" | "b" => {
                let [x, y] = coords::<2>(&keyword, &args)?;
                Command::Begin { x, y }
            }
            "drag" | "move" | "m" => {
                let [x, y] = coords::<2>(&keyword, &args)?;
                Command::Drag { x, y }
            }
            "box" => {
                let [x1, y1, x2, y2] = coords::<4>(&keyword, &args)?;
                Command::Box { x1, y1, x2, y2 }
            }
            "class" | "c" => match args.as_slice() {
                [] => return Err("usage: class ID|NAME".to_string()),
                name => Command::Class(name.join(" ")),
            },
            "delete" | "del" => Command::Delete(number(&keyword, &args)?),
            "goto" | "g" => Command::Goto(number(&keyword, &args)?),
            other => {
                if !args.is_empty() {
                    return Err(format!("'{other}' takes no arguments"));
                }
                match other {
                    "finish" | "f" => Command::Finish,
                    "cancel" => Command::Cancel,
                    "undo" | "u" => Command::Undo,
                    "redo" | "r" => Command::Redo,
                    "clear" => Command::Clear,
                    "list" | "ls" | "l" => Command::List,
                    "classes" => Command::Classes,
                    "save" | "s" => Command::Save,
                    "next" | "n" => Command::Next,
                    "prev" | "p" => Command::Prev,
                    "help" | "h" | "?" => Command::Help,
                    "quit" | "q" | "exit" => Command::Quit,
                    _ => return Err(format!("unknown command '{other}'; try 'help'")),
                }
            }
        };

        Ok(command)
    }
}

fn coords<const N: usize>(keyword: &str, args: &[&str]) -> Result<[f64; N], String> {
    if args.len() != N {
        return Err(format!(
            "'{keyword}' expects {N} coordinates, got {}",
            args.len()
        ));
    }

    let mut values = [0.0; N];
    for (slot, raw) in values.iter_mut().zip(args) {
        let value = raw
            .parse::<f64>()
            .map_err(|_| format!("invalid coordinate '{raw}'"))?;
        if !value.is_finite() {
            return Err(format!("invalid coordinate '{raw}'"));
        }
        *slot = value;
    }
    Ok(values)
}

fn number(keyword: &str, args: &[&str]) -> Result<usize, String> {
    let [raw] = args else {
        return Err(format!("usage: {keyword} N"));
    };
    match raw.parse::<usize>() {
        Ok(0) => Err("numbering starts at 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("invalid number '{raw}'")),
    }
}
