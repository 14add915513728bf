//! Image of the day, picked deterministically from the curated gallery.

use crate::datetime::today_string;
use crate::error::FetchError;
use crate::module::{CachePolicy, DigestModule, ModuleOutput};
use crate::providers::pick_index;

struct GalleryImage {
    title: &'static str,
    image_url: &'static str,
    page_url: &'static str,
}

const GALLERY: &[GalleryImage] = &[
    GalleryImage {
        title: "Sunrise over Saint Mary Lake",
        image_url: "https://www.nps.gov/common/uploads/structured_data/glac-stmary-sunrise.jpg",
        page_url: "https://www.nps.gov/glac/learn/photosmultimedia/photogallery.htm",
    },
    GalleryImage {
        title: "Wild Goose Island",
        image_url: "https://www.nps.gov/common/uploads/structured_data/glac-wild-goose-island.jpg",
        page_url: "https://www.nps.gov/glac/learn/photosmultimedia/photogallery.htm",
    },
    GalleryImage {
        title: "Hidden Lake and Bearhat Mountain",
        image_url: "https://www.nps.gov/common/uploads/structured_data/glac-hidden-lake.jpg",
        page_url: "https://www.nps.gov/glac/learn/photosmultimedia/photogallery.htm",
    },
    GalleryImage {
        title: "Grinnell Glacier overlook",
        image_url: "https://www.nps.gov/common/uploads/structured_data/glac-grinnell.jpg",
        page_url: "https://www.nps.gov/glac/learn/photosmultimedia/photogallery.htm",
    },
    GalleryImage {
        title: "Mountain goat near Logan Pass",
        image_url: "https://www.nps.gov/common/uploads/structured_data/glac-goat-logan-pass.jpg",
        page_url: "https://www.nps.gov/glac/learn/photosmultimedia/photogallery.htm",
    },
    GalleryImage {
        title: "Lake McDonald in autumn",
        image_url: "https://www.nps.gov/common/uploads/structured_data/glac-lake-mcdonald.jpg",
        page_url: "https://www.nps.gov/glac/learn/photosmultimedia/photogallery.htm",
    },
];

pub struct ImageOfTheDayModule;

impl DigestModule for ImageOfTheDayModule {
    fn name(&self) -> &'static str {
        "image_otd"
    }

    fn field_keys(&self) -> &'static [&'static str] {
        &["image_otd", "image_otd_title", "image_otd_link"]
    }

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::Primary
    }

    fn fetch(&self) -> Result<ModuleOutput, FetchError> {
        Ok(output_for(&today_string()))
    }
}

fn output_for(date: &str) -> ModuleOutput {
    let image = &GALLERY[pick_index(date, "image_otd", GALLERY.len())];
    ModuleOutput::new()
        .with_field("image_otd", image.image_url)
        .with_field("image_otd_title", image.title)
        .with_field("image_otd_link", image.page_url)
}
