//! Application state machine and event dispatcher.

use std::sync::Arc;

use casebook_core::{
  crime::{Contact, Crime},
  feed::{ListenerId, StoreEvent},
  photo::PhotoStore,
  projection::{Projection, SortOrder},
  session::EditSession,
  store::CrimeStore,
};
use chrono::{NaiveDate, NaiveTime, Timelike};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use tokio::sync::mpsc;
use uuid::Uuid;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the crime list; right pane shows the empty hint.
  CrimeList,
  /// Focus on the detail pane, editing one crime.
  CrimeDetail,
}

// ─── Fields ───────────────────────────────────────────────────────────────────

/// The editable rows of the detail pane, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Title,
  Date,
  Time,
  Solved,
  Suspect,
  Phone,
}

impl Field {
  pub const ALL: [Field; 6] = [
    Field::Title,
    Field::Date,
    Field::Time,
    Field::Solved,
    Field::Suspect,
    Field::Phone,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Field::Title => "title",
      Field::Date => "date",
      Field::Time => "time",
      Field::Solved => "solved",
      Field::Suspect => "suspect",
      Field::Phone => "phone",
    }
  }

  /// Current value as shown (and as pre-filled when editing starts).
  pub fn value(self, crime: &Crime) -> String {
    match self {
      Field::Title => crime.title.clone(),
      Field::Date => crime.date.format("%Y-%m-%d").to_string(),
      Field::Time => crime.date.format("%H:%M").to_string(),
      Field::Solved => if crime.is_solved { "yes" } else { "no" }.to_string(),
      Field::Suspect => crime.suspect.clone(),
      Field::Phone => crime.suspect_phone.clone(),
    }
  }
}

/// An in-progress text edit of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
  pub field:  Field,
  pub buffer: String,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S: CrimeStore> {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// Display-ordered snapshot of every crime.
  pub projection: Projection,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* crime list.
  pub list_cursor: usize,

  /// The crime being edited in the detail pane.
  pub session: Option<EditSession<S>>,

  /// Selected row of [`Field::ALL`] in the detail pane.
  pub field_cursor: usize,

  /// Text edit in progress, if any.
  pub input: Option<Input>,

  /// Report text, shown under the fields once requested.
  pub report: Option<String>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  pub photos: PhotoStore,

  pub store: Arc<S>,

  events:   mpsc::UnboundedReceiver<StoreEvent>,
  listener: ListenerId,
}

impl<S: CrimeStore> App<S> {
  /// Create an [`App`] with an empty list, subscribed to `store`'s changes.
  pub fn new(store: Arc<S>, photos: PhotoStore, order: SortOrder) -> Self {
    let (tx, events) = mpsc::unbounded_channel();
    let listener = store.changes().subscribe(move |event| {
      // The receiver only disappears together with the App.
      let _ = tx.send(*event);
    });

    Self {
      screen: Screen::CrimeList,
      projection: Projection::new(Vec::new(), order),
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      session: None,
      field_cursor: 0,
      input: None,
      report: None,
      status_msg: String::new(),
      photos,
      store,
      events,
      listener,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Re-read every crime and rebuild the projection, keeping the cursor on
  /// the same crime when it is still listed.
  pub async fn refresh(&mut self) -> anyhow::Result<()> {
    let crimes = self.store.list_all().await?;
    let next = Projection::new(crimes, self.projection.order());
    let diff = self.projection.diff(&next);
    if !diff.is_empty() {
      let counts = diff.counts();
      tracing::debug!(
        inserted = counts.inserted,
        removed = counts.removed,
        moved = counts.moved,
        changed = counts.changed,
        "crime list changed"
      );
    }

    let selected = self.cursor_crime().map(|c| c.id);
    self.projection = next;
    self.restore_cursor(selected);
    Ok(())
  }

  /// Drain pending store events; refresh once if there were any.
  pub async fn sync(&mut self) -> anyhow::Result<()> {
    let mut pending = false;
    while self.events.try_recv().is_ok() {
      pending = true;
    }
    if pending {
      self.refresh().await?;
    }
    Ok(())
  }

  fn restore_cursor(&mut self, selected: Option<Uuid>) {
    let list = self.filtered_crimes();
    let found = selected.and_then(|id| list.iter().position(|c| c.id == id));
    let len = list.len();
    self.list_cursor = match found {
      Some(i) => i,
      None => self.list_cursor.min(len.saturating_sub(1)),
    };
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Returns crimes whose title matches the current filter query.
  pub fn filtered_crimes(&self) -> Vec<&Crime> {
    if self.filter.is_empty() {
      return self.projection.items().iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .projection
      .items()
      .iter()
      .filter(|c| matcher.fuzzy_match(&c.title, &self.filter).is_some())
      .collect()
  }

  /// The crime under the list cursor in the filtered view, if any.
  pub fn cursor_crime(&self) -> Option<&Crime> {
    let list = self.filtered_crimes();
    list.get(self.list_cursor).copied()
  }

  /// The field under the detail cursor.
  pub fn cursor_field(&self) -> Field { Field::ALL[self.field_cursor] }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.input.is_some() {
      self.handle_input_key(key).await;
      return Ok(true);
    }

    // Filter input mode: all printable keys go into the filter string.
    if self.filter_active {
      return self.handle_filter_key(key).await;
    }

    match self.screen {
      Screen::CrimeList => self.handle_list_key(key).await,
      Screen::CrimeDetail => self.handle_detail_key(key).await,
    }
  }

  async fn handle_filter_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Immediately open detail if there's exactly one match.
        let only = match self.filtered_crimes().as_slice() {
          [crime] => Some(crime.id),
          _ => None,
        };
        if let Some(id) = only {
          self.open_detail(id).await?;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
    Ok(true)
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_crimes().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      // Open detail; an empty list offers a new crime instead.
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        match self.cursor_crime().map(|c| c.id) {
          Some(id) => self.open_detail(id).await?,
          None if self.projection.is_empty() => self.new_crime().await?,
          None => {}
        }
      }

      KeyCode::Char('n') => self.new_crime().await?,

      KeyCode::Char('d') | KeyCode::Delete => {
        if let Some(crime) = self.cursor_crime().cloned() {
          self.store.delete(crime.id).await?;
          self.status_msg = format!("Deleted \"{}\"", crime.title);
        }
      }

      // Cycle sort order
      KeyCode::Char('s') => {
        let next = match self.projection.order() {
          SortOrder::NewestFirst => SortOrder::OldestFirst,
          SortOrder::OldestFirst => SortOrder::Title,
          SortOrder::Title => SortOrder::NewestFirst,
        };
        let selected = self.cursor_crime().map(|c| c.id);
        self.projection = Projection::new(self.projection.items().to_vec(), next);
        self.restore_cursor(selected);
        self.status_msg = format!("Sorted by {next:?}");
      }

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_detail_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => {
        self.close_detail().await;
        return Ok(false);
      }

      // Back to list
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => self.close_detail().await,

      // Save and close, but only with a title.
      KeyCode::Char('w') => self.submit().await,

      // Field navigation
      KeyCode::Down | KeyCode::Char('j') => {
        if self.field_cursor + 1 < Field::ALL.len() {
          self.field_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.field_cursor = self.field_cursor.saturating_sub(1);
      }

      // Edit or toggle the selected field
      KeyCode::Enter | KeyCode::Char(' ') => {
        let field = self.cursor_field();
        if field == Field::Solved {
          self.toggle_solved().await;
        } else if let Some(session) = &self.session {
          self.input = Some(Input {
            field,
            buffer: field.value(session.crime()),
          });
        }
      }

      // Share report
      KeyCode::Char('r') => {
        self.report = match self.report {
          Some(_) => None,
          None => self.session.as_ref().map(EditSession::report_text),
        };
      }

      // Contact suspect
      KeyCode::Char('c') => {
        if let Some(session) = &self.session {
          self.status_msg = match session.crime().dial_uri() {
            Some(uri) => format!("Dial {uri}"),
            None => "No suspect with a phone number to call".into(),
          };
        }
      }

      // Clear suspect
      KeyCode::Char('x') => {
        if let Some(session) = self.session.as_mut() {
          let result = session.clear_suspect().await;
          self.report_edit(result);
        }
      }

      _ => {}
    }
    Ok(true)
  }

  /// Keys while a field is being typed into. Title edits are saved on every
  /// keystroke; other fields are applied on Enter.
  async fn handle_input_key(&mut self, key: KeyEvent) {
    let Some(input) = self.input.as_mut() else {
      return;
    };

    match key.code {
      KeyCode::Esc => {
        self.input = None;
      }
      KeyCode::Enter => {
        if let Some(input) = self.input.take() {
          self.apply_input(input).await;
        }
      }
      KeyCode::Backspace => {
        input.buffer.pop();
        if input.field == Field::Title {
          let title = input.buffer.clone();
          self.save_title(title).await;
        }
      }
      KeyCode::Char(c) => {
        input.buffer.push(c);
        if input.field == Field::Title {
          let title = input.buffer.clone();
          self.save_title(title).await;
        }
      }
      _ => {}
    }
  }

  // ── Edits ─────────────────────────────────────────────────────────────────

  async fn save_title(&mut self, title: String) {
    if let Some(session) = self.session.as_mut() {
      let result = session.set_title(title).await;
      self.report_edit(result);
    }
  }

  async fn toggle_solved(&mut self) {
    if let Some(session) = self.session.as_mut() {
      let solved = !session.crime().is_solved;
      let result = session.set_solved(solved).await;
      self.report_edit(result);
    }
  }

  async fn apply_input(&mut self, input: Input) {
    let Some(session) = self.session.as_mut() else {
      return;
    };
    let text = input.buffer.trim();

    let result = match input.field {
      Field::Title => session.set_title(input.buffer.clone()).await,
      Field::Date => match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => session.set_date(date).await,
        Err(_) => {
          self.status_msg = format!("Not a date (YYYY-MM-DD): {text}");
          return;
        }
      },
      Field::Time => match NaiveTime::parse_from_str(text, "%H:%M") {
        Ok(time) => session.set_time(time.hour(), time.minute()).await,
        Err(_) => {
          self.status_msg = format!("Not a time (HH:MM): {text}");
          return;
        }
      },
      Field::Suspect => {
        let phone = session.crime().suspect_phone.clone();
        session.apply_contact(Contact::new(text, phone)).await
      }
      Field::Phone => {
        let name = session.crime().suspect.clone();
        session.apply_contact(Contact::new(name, text)).await
      }
      Field::Solved => return,
    };
    self.report_edit(result);
  }

  /// Surface an edit failure in the status bar; edits never abort the UI.
  fn report_edit(&mut self, result: Result<(), S::Error>) {
    match result {
      Ok(()) => {
        if let (Some(report), Some(session)) = (&mut self.report, &self.session) {
          *report = session.report_text();
        }
      }
      Err(e) => {
        tracing::warn!(error = %e, "edit failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  async fn submit(&mut self) {
    let Some(session) = self.session.as_mut() else {
      return;
    };
    match session.submit().await {
      Ok(()) => self.close_detail().await,
      Err(e) => self.status_msg = format!("{e}"),
    }
  }

  // ── Screen transitions ────────────────────────────────────────────────────

  /// Persist a fresh crime and open it with the title ready for typing.
  async fn new_crime(&mut self) -> anyhow::Result<()> {
    let session = EditSession::create(Arc::clone(&self.store)).await?;
    tracing::info!(id = %session.id(), "recording new crime");
    self.enter_detail(session);
    self.input = Some(Input { field: Field::Title, buffer: String::new() });
    Ok(())
  }

  /// Transition to `CrimeDetail` for `id`.
  async fn open_detail(&mut self, id: Uuid) -> anyhow::Result<()> {
    match EditSession::open(Arc::clone(&self.store), id).await? {
      Some(session) => self.enter_detail(session),
      None => self.status_msg = "That crime no longer exists".into(),
    }
    Ok(())
  }

  fn enter_detail(&mut self, session: EditSession<S>) {
    self.session = Some(session);
    self.screen = Screen::CrimeDetail;
    self.field_cursor = 0;
    self.report = None;
    self.input = None;
    self.status_msg.clear();
  }

  /// End the open session (defaulting a blank title) and return to the list.
  pub async fn close_detail(&mut self) {
    self.input = None;
    self.report = None;
    self.screen = Screen::CrimeList;
    if let Some(session) = self.session.take() {
      let id = session.id();
      match session.finish().await {
        Ok(crime) => {
          self.status_msg = format!("Saved \"{}\"", crime.title);
          self.restore_cursor(Some(id));
        }
        Err(e) => {
          tracing::warn!(%id, error = %e, "could not save crime on close");
          self.status_msg = format!("Error: {e}");
        }
      }
    }
  }
}

impl<S: CrimeStore> Drop for App<S> {
  fn drop(&mut self) { self.store.changes().unsubscribe(self.listener); }
}

#[cfg(test)]
mod tests {
  use casebook_core::{crime::UNNAMED_TITLE, memory::MemoryStore};

  use super::*;

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  async fn press(app: &mut App<MemoryStore>, code: KeyCode) -> bool {
    app.handle_key(key(code)).await.unwrap()
  }

  async fn type_str(app: &mut App<MemoryStore>, text: &str) {
    for c in text.chars() {
      press(app, KeyCode::Char(c)).await;
    }
  }

  fn app(store: Arc<MemoryStore>) -> App<MemoryStore> {
    App::new(store, PhotoStore::new("photos"), SortOrder::NewestFirst)
  }

  #[tokio::test]
  async fn enter_on_empty_list_creates_a_crime() {
    let store = Arc::new(MemoryStore::new());
    let mut app = app(Arc::clone(&store));
    app.refresh().await.unwrap();
    assert!(app.projection.is_empty());

    press(&mut app, KeyCode::Enter).await;
    assert_eq!(app.screen, Screen::CrimeDetail);
    assert_eq!(app.input.as_ref().map(|i| i.field), Some(Field::Title));
    assert_eq!(store.list_all().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn title_is_saved_per_keystroke() {
    let store = Arc::new(MemoryStore::new());
    let mut app = app(Arc::clone(&store));
    press(&mut app, KeyCode::Char('n')).await;
    let id = app.session.as_ref().unwrap().id();

    type_str(&mut app, "Arson").await;
    assert_eq!(store.get(id).await.unwrap().unwrap().title, "Arson");

    press(&mut app, KeyCode::Backspace).await;
    assert_eq!(store.get(id).await.unwrap().unwrap().title, "Arso");
  }

  #[tokio::test]
  async fn leaving_with_blank_title_defaults_it() {
    let store = Arc::new(MemoryStore::new());
    let mut app = app(Arc::clone(&store));
    press(&mut app, KeyCode::Char('n')).await;
    let id = app.session.as_ref().unwrap().id();

    press(&mut app, KeyCode::Esc).await; // stop typing
    press(&mut app, KeyCode::Esc).await; // leave detail
    assert_eq!(app.screen, Screen::CrimeList);
    assert_eq!(store.get(id).await.unwrap().unwrap().title, UNNAMED_TITLE);
  }

  #[tokio::test]
  async fn submit_refuses_blank_title() {
    let store = Arc::new(MemoryStore::new());
    let mut app = app(Arc::clone(&store));
    press(&mut app, KeyCode::Char('n')).await;
    press(&mut app, KeyCode::Esc).await;

    press(&mut app, KeyCode::Char('w')).await;
    assert_eq!(app.screen, Screen::CrimeDetail);
    assert!(!app.status_msg.is_empty());
  }

  #[tokio::test]
  async fn store_events_refresh_the_list() {
    let store = Arc::new(MemoryStore::new());
    let mut app = app(Arc::clone(&store));
    app.refresh().await.unwrap();

    store.create(Crime::with_title("Outside write")).await.unwrap();
    app.sync().await.unwrap();
    assert_eq!(app.projection.len(), 1);
  }

  #[tokio::test]
  async fn delete_from_list() {
    let crime = Crime::with_title("Jaywalking");
    let store = Arc::new(MemoryStore::with_crimes([crime.clone()]));
    let mut app = app(Arc::clone(&store));
    app.refresh().await.unwrap();

    press(&mut app, KeyCode::Char('d')).await;
    app.sync().await.unwrap();
    assert!(store.get(crime.id).await.unwrap().is_none());
    assert!(app.projection.is_empty());
  }

  #[tokio::test]
  async fn editing_suspect_and_phone_enables_contact() {
    let crime = Crime::with_title("Fraud");
    let store = Arc::new(MemoryStore::with_crimes([crime.clone()]));
    let mut app = app(Arc::clone(&store));
    app.refresh().await.unwrap();
    press(&mut app, KeyCode::Enter).await;

    // Move to the suspect row and type a name.
    for _ in 0..4 {
      press(&mut app, KeyCode::Down).await;
    }
    assert_eq!(app.cursor_field(), Field::Suspect);
    press(&mut app, KeyCode::Enter).await;
    type_str(&mut app, "Jane Doe").await;
    press(&mut app, KeyCode::Enter).await;
    assert!(!store.get(crime.id).await.unwrap().unwrap().can_contact_suspect());

    press(&mut app, KeyCode::Down).await;
    press(&mut app, KeyCode::Enter).await;
    type_str(&mut app, "555-0100").await;
    press(&mut app, KeyCode::Enter).await;

    let stored = store.get(crime.id).await.unwrap().unwrap();
    assert_eq!(stored.suspect, "Jane Doe");
    assert!(stored.can_contact_suspect());

    press(&mut app, KeyCode::Char('c')).await;
    assert_eq!(app.status_msg, "Dial tel:555-0100");
  }

  #[tokio::test]
  async fn bad_time_input_keeps_the_old_date() {
    let crime = Crime::with_title("Loitering");
    let store = Arc::new(MemoryStore::with_crimes([crime.clone()]));
    let mut app = app(Arc::clone(&store));
    app.refresh().await.unwrap();
    press(&mut app, KeyCode::Enter).await;

    app.field_cursor = 2;
    press(&mut app, KeyCode::Enter).await;
    app.input.as_mut().unwrap().buffer = "quarter past".into();
    press(&mut app, KeyCode::Enter).await;

    assert!(app.status_msg.starts_with("Not a time"));
    assert_eq!(store.get(crime.id).await.unwrap().unwrap().date, crime.date);
  }

  #[tokio::test]
  async fn dropping_the_app_unsubscribes() {
    let store = Arc::new(MemoryStore::new());
    let app = app(Arc::clone(&store));
    assert_eq!(store.changes().len(), 1);
    drop(app);
    assert!(store.changes().is_empty());
  }
}
