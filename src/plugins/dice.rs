//! `!roll` for Fate and DnD dice.

use super::Plugin;
use crate::bus::EventBus;
use crate::event::{EventCategory, EventKind, NormalizedEvent};
use crate::outbound::Outbound;
use parking_lot::Mutex;
use rand::Rng;
use regex::{Captures, Regex};
use serde_json::{Value, json};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// Yields uniform values in `[0, 1)`.
pub type RandomSource = Box<dyn FnMut() -> f64 + Send>;

pub const DEFAULT_MAX_DICE: u64 = 100;

static FATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([1-9]\d*)dF(ate)?((\+|-)\d+)?$").expect("fate pattern is valid")
});

static DND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([1-9]\d*)d([1-9]\d*)$").expect("dnd pattern is valid"));

/// A parsed dice argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roll {
    pub input: String,
    pub sides: u32,
    pub count: i64,
    pub bonus: i64,
}

/// A dice notation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum System {
    Fate,
    Dnd,
}

impl System {
    /// Systems in the order they are tried.
    pub const ALL: [System; 2] = [System::Fate, System::Dnd];

    fn pattern(self) -> &'static Regex {
        match self {
            System::Fate => &FATE,
            System::Dnd => &DND,
        }
    }

    /// Whether more than one argument of this system may be rolled at once.
    pub fn multiple(self) -> bool {
        matches!(self, System::Dnd)
    }

    /// Whether `arg` is written in this system's notation.
    pub fn matches(self, arg: &str) -> bool {
        self.pattern().is_match(arg)
    }

    /// The first system whose notation matches `arg`.
    pub fn detect(arg: &str) -> Option<System> {
        Self::ALL.into_iter().find(|s| s.matches(arg))
    }

    /// Parse `arg`. Numbers too large to represent do not parse.
    pub fn parse(self, arg: &str) -> Option<Roll> {
        let caps = self.pattern().captures(arg)?;
        let count = number(&caps, 1)?;
        match self {
            System::Fate => Some(Roll {
                input: arg.to_string(),
                sides: 6,
                count,
                bonus: caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?,
            }),
            System::Dnd => Some(Roll {
                input: arg.to_string(),
                sides: u32::try_from(number(&caps, 2)?).ok()?,
                count,
                bonus: 0,
            }),
        }
    }

    pub fn format(self, roll: &Roll, dice: &[u32]) -> String {
        match self {
            System::Fate => format_fate(roll.bonus, dice),
            System::Dnd => format_dnd(&roll.input, dice),
        }
    }
}

fn number(caps: &Captures<'_>, group: usize) -> Option<i64> {
    caps.get(group)?.as_str().parse().ok()
}

fn fate_value(die: u32) -> i64 {
    match die {
        0..=2 => -1,
        3..=4 => 0,
        _ => 1,
    }
}

fn fate_symbol(die: u32) -> &'static str {
    match fate_value(die) {
        -1 => "[-]",
        0 => "[0]",
        _ => "[+]",
    }
}

/// `|| [-] [0] [+] || total` with the breakdown appended when there is a bonus.
pub fn format_fate(bonus: i64, dice: &[u32]) -> String {
    let symbols: Vec<&str> = dice.iter().map(|&d| fate_symbol(d)).collect();
    let sum: i64 = dice.iter().map(|&d| fate_value(d)).sum();
    let total = i128::from(sum) + i128::from(bonus);
    let mut out = format!("|| {} || {}", symbols.join(" "), total);
    if bonus != 0 {
        let sign = if bonus < 0 { "" } else { "+" };
        out.push_str(&format!(" ({sum}{sign}{bonus})"));
    }
    out
}

/// `|| (input) r1, r2 || sum`
pub fn format_dnd(input: &str, dice: &[u32]) -> String {
    let rolls: Vec<String> = dice.iter().map(u32::to_string).collect();
    let sum: u64 = dice.iter().map(|&d| u64::from(d)).sum();
    format!("|| ({}) {} || {}", input, rolls.join(", "), sum)
}

/// Roll `|count|` dice of `sides` faces.
pub fn get_dice(random: &mut dyn FnMut() -> f64, sides: u32, count: i64) -> Vec<u32> {
    (0..count.unsigned_abs())
        .map(|_| (random() * f64::from(sides)).floor() as u32 + 1)
        .collect()
}

fn thread_random() -> f64 {
    rand::thread_rng().gen_range(0.0..1.0)
}

struct Roller {
    random: RandomSource,
    max_dice: u64,
}

impl Roller {
    /// Answer a `!roll` event. Returns whether the event was handled.
    fn roll(&mut self, out: &Outbound, event: &mut NormalizedEvent) -> bool {
        if !event.command().is_some_and(|c| c.eq_ignore_ascii_case("!roll")) {
            return false;
        }
        let Some(system) = event.args().first().and_then(|a| System::detect(a)) else {
            return false;
        };
        let Some(command) = event.claim_command() else {
            return false;
        };

        let mut args = command.args.into_iter().peekable();
        let mut results = Vec::new();
        while let Some(arg) = args.next_if(|a| system.matches(a)) {
            let Some(roll) = system.parse(&arg) else {
                send(out, event, format!("refusing to roll {arg}"), false);
                return true;
            };
            if roll.count.unsigned_abs() > self.max_dice {
                let refusal = format!(
                    "refusing to roll {} dice (limit is {})",
                    roll.count.unsigned_abs(),
                    self.max_dice
                );
                send(out, event, refusal, false);
                return true;
            }
            let dice = get_dice(&mut *self.random, roll.sides, roll.count);
            results.push(system.format(&roll, &dice));
            if !system.multiple() {
                break;
            }
        }

        let mut rest: Vec<String> = args.collect();
        if rest.first().is_some_and(|a| a == "--") {
            rest.remove(0);
        }
        let mut response = results.join(" ");
        if !rest.is_empty() {
            response.push_str(" || ");
            response.push_str(&rest.join(" "));
        }
        send(out, event, response, true);
        true
    }
}

/// Deliver a dice result: in channel for `/me` rolls, by notice otherwise.
fn send(out: &Outbound, event: &NormalizedEvent, response: String, in_channel: bool) {
    let Some(who) = event.who.as_deref() else {
        debug!(kind = event.kind.as_str(), "no sender to answer, dropping dice result");
        return;
    };
    let result = match (event.kind, event.reply.as_deref()) {
        (EventKind::Action, Some(reply)) if in_channel => {
            out.say(reply, &format!("{who}: {response}"))
        }
        _ => out.notice(who, &response),
    };
    if let Err(e) = result {
        warn!(who = %who, error = %e, "failed to deliver dice result");
    }
}

/// The dice plugin.
pub struct Dice {
    roller: Arc<Mutex<Roller>>,
}

impl Default for Dice {
    fn default() -> Self {
        Self::new()
    }
}

impl Dice {
    /// Dice backed by the thread-local RNG.
    pub fn new() -> Self {
        Self::with_random(Box::new(thread_random))
    }

    /// Dice backed by `random`, which must yield values in `[0, 1)`.
    pub fn with_random(random: RandomSource) -> Self {
        Self {
            roller: Arc::new(Mutex::new(Roller {
                random,
                max_dice: DEFAULT_MAX_DICE,
            })),
        }
    }
}

impl Plugin for Dice {
    fn name(&self) -> &str {
        "dice"
    }

    fn defaults(&self) -> Option<Value> {
        Some(json!({ "max_dice": DEFAULT_MAX_DICE }))
    }

    fn begin(&mut self, config: &Value, bus: &mut EventBus) {
        let max_dice = config
            .get("max_dice")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_MAX_DICE);
        self.roller.lock().max_dice = max_dice;

        let roller = self.roller.clone();
        bus.on(EventCategory::MessageReceived, move |out, event| {
            roller.lock().roll(out, event);
        });
    }

    fn stop(&mut self) {
        info!("Dice Stopping");
    }
}
