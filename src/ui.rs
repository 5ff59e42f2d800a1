use std::cell::RefCell;

use log::LevelFilter;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlElement, KeyboardEvent, Node};

use crate::audio::WebAudio;
use crate::game::{Game, GameEvent, GameStatus};
use crate::grid::{Grid, Pos, Token, EMPTY};
use crate::level::default_levels;
use crate::logging;
use crate::presenter::{AudioNotifier, Renderer, Sound};

const TICK_MS: u32 = 1_000;

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logging::init(LevelFilter::Info);

    let app = App::new()?;
    APP.with(|slot| {
        *slot.borrow_mut() = Some(app);
    });

    with_app_mut(|app| {
        app.attach_event_listeners()?;
        app.begin()
    })
    .transpose()?
    .ok_or_else(|| JsValue::from_str("Application state missing"))?;

    Ok(())
}

fn with_app_mut<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut App) -> R,
{
    APP.with(|slot| {
        let mut borrow = slot.borrow_mut();
        let app = borrow.as_mut()?;
        Some(f(app))
    })
}

/// Deferred work. Each kind carries a generation; bumping it orphans any
/// callback already queued for the old level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    Step,
    Tick,
}

/// DOM renderer plus sound effects, handed to the game as its view.
struct WebView {
    document: Document,
    board: HtmlElement,
    score: HtmlElement,
    timer: HtmlElement,
    cells: Vec<HtmlElement>,
    cols: usize,
    audio: WebAudio,
}

impl WebView {
    fn cell(&self, row: usize, col: usize) -> Option<&HtmlElement> {
        if col >= self.cols {
            return None;
        }

        self.cells.get(row * self.cols + col)
    }

    fn toggle_class(&self, row: usize, col: usize, class: &str, on: bool) {
        if let Some(cell) = self.cell(row, col) {
            let _ = cell.class_list().toggle_with_force(class, on);
        }
    }

    fn paint(cell: &HtmlElement, token: Token) {
        let style = cell.style();
        if token == EMPTY {
            let _ = style.set_property("background-image", "none");
            let _ = cell.class_list().add_1("empty");
        } else {
            let _ = style.set_property("background-image", &format!("url(images/gem{token}.png)"));
            let _ = cell.class_list().remove_1("empty");
        }
        let _ = cell.set_attribute("data-token", &token.to_string());
    }

    fn build_cell(&self, row: usize, col: usize, token: Token) -> Result<HtmlElement, JsValue> {
        let cell = self
            .document
            .create_element("div")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| JsValue::from_str("Cell was not an HTML element"))?;
        cell.set_class_name("cell");
        cell.set_attribute("data-row", &row.to_string())?;
        cell.set_attribute("data-col", &col.to_string())?;
        Self::paint(&cell, token);
        Ok(cell)
    }

    fn mark_cursor(&self, (row, col): Pos, on: bool) {
        self.toggle_class(row, col, "cursor", on);
    }
}

impl Renderer for WebView {
    fn render_grid(&mut self, grid: &Grid) {
        self.board.set_inner_html("");
        let _ = self.board.style().set_property(
            "grid-template-columns",
            &format!("repeat({}, 1fr)", grid.cols()),
        );

        self.cols = grid.cols();
        self.cells.clear();
        for (row, col, token) in grid.iter() {
            let Ok(cell) = self.build_cell(row, col, token) else {
                continue;
            };
            let _ = self.board.append_child(&cell);
            self.cells.push(cell);
        }
    }

    fn update_cell(&mut self, row: usize, col: usize, token: Token) {
        if let Some(cell) = self.cell(row, col) {
            Self::paint(cell, token);
        }
    }

    fn mark_selected(&mut self, row: usize, col: usize, on: bool) {
        self.toggle_class(row, col, "selected", on);
    }

    fn mark_invalid(&mut self, row: usize, col: usize, on: bool) {
        self.toggle_class(row, col, "invalid-shake", on);
    }

    fn mark_new(&mut self, row: usize, col: usize, on: bool) {
        self.toggle_class(row, col, "new-gem", on);
    }

    fn score_changed(&mut self, score: u32) {
        self.score.set_text_content(Some(&score.to_string()));
    }

    fn time_changed(&mut self, remaining_seconds: u32) {
        self.timer
            .set_text_content(Some(&format!("Time left: {remaining_seconds}s")));
    }
}

impl AudioNotifier for WebView {
    fn notify(&mut self, sound: Sound) {
        self.audio.notify(sound);
    }
}

struct App {
    document: Document,
    view: WebView,
    level_label: HtmlElement,
    status: HtmlElement,
    restart_button: HtmlElement,
    sound_toggle: HtmlElement,
    game: Game,
    event_handlers: Vec<Closure<dyn FnMut(Event)>>,
    step_generation: u32,
    tick_generation: u32,
    cursor: Pos,
}

impl App {
    fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("Window unavailable"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Document unavailable"))?;

        let board = by_id::<HtmlElement>(&document, "game-grid")?;
        let score = by_id::<HtmlElement>(&document, "score")?;
        let restart_button = by_id::<HtmlElement>(&document, "restart")?;
        let level_label = by_id_or_create(&document, "level", "div", Anchor::Before(&board))?;
        let status = by_id_or_create(&document, "status", "div", Anchor::Before(&board))?;
        let timer = by_id_or_create(&document, "timer", "div", Anchor::Before(&board))?;
        let sound_toggle =
            by_id_or_create(&document, "sound-toggle", "button", Anchor::After(&score))?;

        let game = Game::new(default_levels()).map_err(|err| JsValue::from_str(&err.to_string()))?;
        let audio = WebAudio::new(&document);

        Ok(Self {
            view: WebView {
                document: document.clone(),
                board,
                score,
                timer,
                cells: Vec::new(),
                cols: 0,
                audio,
            },
            document,
            level_label,
            status,
            restart_button,
            sound_toggle,
            game,
            event_handlers: Vec::new(),
            step_generation: 0,
            tick_generation: 0,
            cursor: (0, 0),
        })
    }

    fn attach_event_listeners(&mut self) -> Result<(), JsValue> {
        let board_click = Closure::wrap(Box::new(move |event: Event| {
            if let Some((row, col)) = event_coords(&event) {
                let _ = with_app_mut(|app| {
                    app.handle_click(row, col);
                });
            }
        }) as Box<dyn FnMut(Event)>);
        self.view
            .board
            .add_event_listener_with_callback("click", board_click.as_ref().unchecked_ref())?;
        self.event_handlers.push(board_click);

        let restart = Closure::wrap(Box::new(move |_event: Event| {
            let _ = with_app_mut(|app| {
                app.restart();
            });
        }) as Box<dyn FnMut(Event)>);
        self.restart_button
            .add_event_listener_with_callback("click", restart.as_ref().unchecked_ref())?;
        self.event_handlers.push(restart);

        let sound_click = Closure::wrap(Box::new(move |_event: Event| {
            let _ = with_app_mut(|app| {
                app.toggle_sound();
            });
        }) as Box<dyn FnMut(Event)>);
        self.sound_toggle
            .add_event_listener_with_callback("click", sound_click.as_ref().unchecked_ref())?;
        self.event_handlers.push(sound_click);

        let keyboard = Closure::wrap(Box::new(move |event: Event| {
            let Ok(key_event) = event.dyn_into::<KeyboardEvent>() else {
                return;
            };

            let handled = with_app_mut(|app| app.handle_key_event(&key_event)).unwrap_or(false);
            if handled {
                key_event.prevent_default();
            }
        }) as Box<dyn FnMut(Event)>);
        self.document
            .add_event_listener_with_callback("keydown", keyboard.as_ref().unchecked_ref())?;
        self.event_handlers.push(keyboard);

        self.render_sound_toggle();
        Ok(())
    }

    fn begin(&mut self) -> Result<(), JsValue> {
        self.game.session().present(&mut self.view);
        self.render_level();
        self.view.mark_cursor(self.cursor, true);
        self.schedule(Task::Tick, TICK_MS)
    }

    fn handle_click(&mut self, row: usize, col: usize) {
        self.set_cursor((row, col));
        self.view.audio.unlock();

        let outcome = self.game.click(row, col, &mut self.view);
        if let Some(wait_ms) = outcome.wait_ms() {
            let _ = self.schedule(Task::Step, wait_ms);
        }
    }

    fn restart(&mut self) {
        self.view.audio.unlock();
        let event = self.game.restart(&mut self.view);
        self.handle_event(event);
    }

    fn toggle_sound(&mut self) {
        self.view.audio.unlock();
        self.view.audio.toggle_muted();
        self.render_sound_toggle();
    }

    fn handle_key_event(&mut self, event: &KeyboardEvent) -> bool {
        match event.key().as_str() {
            "ArrowUp" | "w" | "W" => self.move_cursor(-1, 0),
            "ArrowDown" | "s" | "S" => self.move_cursor(1, 0),
            "ArrowLeft" | "a" | "A" => self.move_cursor(0, -1),
            "ArrowRight" | "d" | "D" => self.move_cursor(0, 1),
            " " | "Enter" => {
                let (row, col) = self.cursor;
                self.handle_click(row, col);
            }
            "r" | "R" => self.restart(),
            "m" | "M" => self.toggle_sound(),
            _ => return false,
        }

        true
    }

    fn move_cursor(&mut self, d_row: i32, d_col: i32) {
        let grid = self.game.session().grid();
        let max_row = grid.rows().saturating_sub(1) as i32;
        let max_col = grid.cols().saturating_sub(1) as i32;
        let row = (self.cursor.0 as i32 + d_row).clamp(0, max_row);
        let col = (self.cursor.1 as i32 + d_col).clamp(0, max_col);
        self.set_cursor((row as usize, col as usize));
    }

    fn set_cursor(&mut self, pos: Pos) {
        if !self.game.session().grid().contains(pos.0, pos.1) {
            return;
        }

        self.view.mark_cursor(self.cursor, false);
        self.cursor = pos;
        self.view.mark_cursor(self.cursor, true);
    }

    fn run(&mut self, task: Task, generation: u32) {
        match task {
            Task::Step if generation == self.step_generation => {
                let progress = self.game.advance(&mut self.view);
                if let Some(wait_ms) = progress.wait_ms {
                    let _ = self.schedule(Task::Step, wait_ms);
                }
                self.handle_event(progress.event);
            }
            Task::Tick if generation == self.tick_generation => {
                let event = self.game.tick(&mut self.view);
                if event == GameEvent::None && self.game.status() == GameStatus::Playing {
                    let _ = self.schedule(Task::Tick, TICK_MS);
                }
                self.handle_event(event);
            }
            _ => {}
        }
    }

    fn schedule(&mut self, task: Task, delay_ms: u32) -> Result<(), JsValue> {
        let generation = match task {
            Task::Step => self.step_generation,
            Task::Tick => self.tick_generation,
        };

        let callback = Closure::once_into_js(move || {
            let _ = with_app_mut(|app| app.run(task, generation));
        });
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("Window unavailable"))?;
        window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay_ms as i32,
        )?;

        Ok(())
    }

    fn cancel_pending(&mut self) {
        self.step_generation = self.step_generation.wrapping_add(1);
        self.tick_generation = self.tick_generation.wrapping_add(1);
    }

    fn handle_event(&mut self, event: GameEvent) {
        let message = match event {
            GameEvent::None => return,
            GameEvent::LevelStarted { .. } => String::new(),
            GameEvent::LevelComplete { index } => format!("Level {} cleared!", index + 1),
            GameEvent::LevelFailed { index } => {
                format!("Time's up! Level {} restarted.", index + 1)
            }
            GameEvent::GameComplete => "All levels cleared!".to_string(),
        };

        self.cancel_pending();
        self.status.set_text_content(Some(&message));
        self.render_level();

        if self.game.status() == GameStatus::Playing {
            self.cursor = (0, 0);
            self.view.mark_cursor(self.cursor, true);
            let _ = self.schedule(Task::Tick, TICK_MS);
        }
    }

    fn render_level(&self) {
        let text = format!(
            "Level {}/{}",
            self.game.level_index() + 1,
            self.game.level_count()
        );
        self.level_label.set_text_content(Some(&text));
    }

    fn render_sound_toggle(&self) {
        let label = if self.view.audio.muted() {
            "\u{1F507} Sound off"
        } else {
            "\u{1F50A} Sound on"
        };
        self.sound_toggle.set_text_content(Some(label));
    }
}

fn by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element with id '{id}'")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Element '{id}' had unexpected type")))
}

/// Where a missing element is inserted, relative to an existing one.
enum Anchor<'a> {
    Before(&'a Node),
    After(&'a Node),
}

/// Looks up `id`, creating a `tag` element at `anchor` when the page lacks it.
fn by_id_or_create(
    document: &Document,
    id: &str,
    tag: &str,
    anchor: Anchor<'_>,
) -> Result<HtmlElement, JsValue> {
    if document.get_element_by_id(id).is_some() {
        return by_id::<HtmlElement>(document, id);
    }

    let element = document
        .create_element(tag)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| JsValue::from_str(&format!("Element '{id}' had unexpected type")))?;
    element.set_id(id);
    if tag == "button" {
        element.set_attribute("type", "button")?;
    }

    let (parent, next) = match anchor {
        Anchor::Before(node) => (node.parent_node(), Some(node.clone())),
        Anchor::After(node) => (node.parent_node(), node.next_sibling()),
    };
    match parent {
        Some(parent) => parent.insert_before(&element, next.as_ref())?,
        None => document
            .body()
            .ok_or_else(|| JsValue::from_str("Document body unavailable"))?
            .append_child(&element)?,
    };

    Ok(element)
}

fn event_coords(event: &Event) -> Option<(usize, usize)> {
    let target = event.target()?;
    let element = target.dyn_into::<Element>().ok()?;

    let row = element.get_attribute("data-row")?.parse::<usize>().ok()?;
    let col = element.get_attribute("data-col")?.parse::<usize>().ok()?;
    Some((row, col))
}
