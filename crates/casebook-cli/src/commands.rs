//! Non-interactive subcommands.

use std::io::Write;

use anyhow::{Context, Result, bail};
use casebook_core::{
  crime::{Crime, REPORT_SUBJECT},
  photo::PhotoStore,
  projection::{Projection, SortOrder},
  store::CrimeStore,
};
use clap::Subcommand;
use uuid::Uuid;

use crate::ui::crime_list::ROW_DATE_FORMAT;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Print every crime in display order.
  List,
  /// Record a new crime with the given title.
  Add { title: String },
  /// Delete a crime. Deleting an unknown id is not an error.
  Delete { id: Uuid },
  /// Print the shareable report for a crime.
  Report {
    id:      Uuid,
    /// Also print the report's subject line.
    #[arg(long)]
    subject: bool,
  },
  /// Print where a crime's photo lives and whether it has been taken.
  Photo { id: Uuid },
  /// Dump every crime as JSON.
  Export,
}

/// Run `command` against `store`, writing its output to `out`.
pub async fn run<S: CrimeStore>(
  command: Command,
  store: &S,
  photos: &PhotoStore,
  sort: SortOrder,
  out: &mut impl Write,
) -> Result<()> {
  match command {
    Command::List => {
      let projection = Projection::new(store.list_all().await?, sort);
      if projection.is_empty() {
        writeln!(out, "No crimes recorded.")?;
      }
      for crime in projection.items() {
        let mark = if crime.is_solved { "✔" } else { " " };
        let title = if crime.title.is_empty() { "(untitled)" } else { crime.title.as_str() };
        writeln!(
          out,
          "{mark} {}  {}  {title}",
          crime.id,
          crime.date.format(ROW_DATE_FORMAT),
        )?;
      }
    }

    Command::Add { title } => {
      let crime = store.create(Crime::with_title(title)).await?;
      writeln!(out, "{}", crime.id)?;
    }

    Command::Delete { id } => {
      if !store.delete(id).await? {
        tracing::info!(%id, "no such crime; nothing deleted");
      }
    }

    Command::Report { id, subject } => {
      let crime = fetch(store, id).await?;
      if subject {
        writeln!(out, "{REPORT_SUBJECT}\n")?;
      }
      writeln!(out, "{}", crime.report_text())?;
    }

    Command::Photo { id } => {
      fetch(store, id).await?;
      let status = if photos.exists(id) { "present" } else { "no photo yet" };
      writeln!(out, "{} ({status})", photos.path(id).display())?;
    }

    Command::Export => {
      let projection = Projection::new(store.list_all().await?, sort);
      let json = serde_json::to_string_pretty(projection.items())
        .context("failed to serialise crimes")?;
      writeln!(out, "{json}")?;
    }
  }
  Ok(())
}

async fn fetch<S: CrimeStore>(store: &S, id: Uuid) -> Result<Crime> {
  match store.get(id).await? {
    Some(crime) => Ok(crime),
    None => bail!("no crime with id {id}"),
  }
}
