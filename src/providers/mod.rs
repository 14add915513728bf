//! Built-in data-source modules.
//!
//! Dynamic providers (weather, roads, trails, campgrounds, events,
//! notices) fetch live feeds and use the fallback cache policy.
//! Date-seeded providers (peak, image and product of the day) are pure
//! functions of the canonical date and use the primary cache policy.

pub mod campgrounds;
pub mod events;
pub mod http;
pub mod image_otd;
pub mod notices;
pub mod peak;
pub mod product_otd;
pub mod roads;
pub mod trails;
pub mod weather;

use crate::config::Settings;
use crate::module::DigestModule;

/// The full module roster for one run.
#[must_use]
pub fn all_modules(settings: &Settings) -> Vec<Box<dyn DigestModule>> {
    vec![
        Box::new(weather::WeatherModule::new(&settings.user_agent)),
        Box::new(roads::RoadsModule::new(&settings.user_agent)),
        Box::new(trails::TrailsModule::new(&settings.user_agent)),
        Box::new(campgrounds::CampgroundsModule::new(&settings.user_agent)),
        Box::new(events::EventsModule::new(settings)),
        Box::new(notices::NoticesModule::new(settings)),
        Box::new(peak::PeakModule),
        Box::new(image_otd::ImageOfTheDayModule),
        Box::new(product_otd::ProductOfTheDayModule),
    ]
}

/// Deterministic index into a fixed list, seeded by the canonical date
/// and a per-module salt so different modules decorrelate on the same
/// day. FNV-1a over the salted date.
#[must_use]
pub(crate) fn pick_index(date: &str, salt: &str, len: usize) -> usize {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in salt.bytes().chain(date.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash % len as u64) as usize
}
