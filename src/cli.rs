use crate::{
    app::{Event, Screen},
    auth::{LoginRequest, RegisterRequest},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Event(Event),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  login <email> <password>              log in
  register <email> <password> <name...> create an account
  toggle                                switch between login and register
  dashboard | inventory | logout        navigate
  refresh                               reload the inventory
  search [term...]                      filter by name (empty clears)
  date [YYYY-MM-DD]                     filter by creation date (empty clears)
  clear                                 drop both filters
  detail <id> | close                   open / dismiss the detail view
  delete <id>                           delete a device (asks first)
  new | edit <id>                       open the device form
  set <field> <value...>                fill a form field
  save | cancel                         submit / leave the form
  help | quit
emails and passwords are single words; spaces separate arguments.";

/// Maps one input line to a command for the current screen.
pub fn parse(line: &str, screen: &Screen) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    // The delete prompt blocks everything else.
    if let Screen::Inventory(view) = screen {
        if view.pending_delete.is_some() {
            return match word.to_lowercase().as_str() {
                "y" | "yes" => Ok(Command::Event(Event::ConfirmDelete(true))),
                "n" | "no" => Ok(Command::Event(Event::ConfirmDelete(false))),
                _ => Err("Answer yes or no.".into()),
            };
        }
    }

    let event = match word {
        "" => return Err("Type a command, or help.".into()),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "toggle" => Event::ToggleAuth,
        "login" => {
            let (email, password) = two_args(rest, "login <email> <password>")?;
            Event::Login(LoginRequest { email, password })
        }
        "register" => {
            let usage = || "usage: register <email> <password> <full name>".to_string();
            let (email, rest) = next_token(rest).ok_or_else(usage)?;
            let (password, fullname) = next_token(rest).ok_or_else(usage)?;
            if fullname.is_empty() {
                return Err(usage());
            }
            Event::Register(RegisterRequest {
                fullname: fullname.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
        }
        "logout" => Event::Logout,
        "dashboard" => Event::OpenDashboard,
        "inventory" | "list" => Event::OpenInventory,
        "refresh" => Event::Refresh,
        "search" => Event::Search(rest.to_string()),
        "date" => Event::FilterDate(rest.to_string()),
        "clear" => Event::ClearFilters,
        "detail" | "view" => Event::ShowDetail(one_arg(rest, "detail <id>")?),
        "close" => Event::CloseDetail,
        "delete" => Event::RequestDelete(one_arg(rest, "delete <id>")?),
        "new" | "add" => Event::NewDevice,
        "edit" => Event::EditDevice(one_arg(rest, "edit <id>")?),
        "set" => {
            let Some((field, value)) = rest.split_once(char::is_whitespace) else {
                return Err("usage: set <field> <value>".into());
            };
            Event::SetField {
                field: field.to_string(),
                value: value.trim().to_string(),
            }
        }
        "save" | "submit" => Event::Submit,
        "cancel" => Event::Cancel,
        other => return Err(format!("Unknown command {other}, try help.")),
    };
    Ok(Command::Event(event))
}

/// First whitespace-separated token and the trimmed remainder.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(match s.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (s, ""),
    })
}

fn one_arg(rest: &str, usage: &str) -> Result<String, String> {
    match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        [one] => Ok(one.to_string()),
        _ => Err(format!("usage: {usage}")),
    }
}

fn two_args(rest: &str, usage: &str) -> Result<(String, String), String> {
    match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        [a, b] => Ok((a.to_string(), b.to_string())),
        _ => Err(format!("usage: {usage}")),
    }
}
