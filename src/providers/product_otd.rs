//! Featured store product of the day.

use crate::datetime::today_string;
use crate::error::FetchError;
use crate::module::{CachePolicy, DigestModule, ModuleOutput};
use crate::providers::pick_index;

struct Product {
    title: &'static str,
    link: &'static str,
    description: &'static str,
}

const PRODUCTS: &[Product] = &[
    Product {
        title: "Glacier National Park Trail Map",
        link: "https://shop.glacier.org/products/trail-map",
        description: "Waterproof topographic map covering every maintained trail in the park.",
    },
    Product {
        title: "Wildflowers of Glacier Field Guide",
        link: "https://shop.glacier.org/products/wildflower-guide",
        description: "Pocket guide to the park's alpine and valley wildflowers.",
    },
    Product {
        title: "Going-to-the-Sun Road Poster",
        link: "https://shop.glacier.org/products/gtsr-poster",
        description: "Vintage-style print of the park's most famous drive.",
    },
    Product {
        title: "Huckleberry Coffee Blend",
        link: "https://shop.glacier.org/products/huckleberry-coffee",
        description: "Montana-roasted coffee with a hint of huckleberry.",
    },
    Product {
        title: "Bear Aware Enamel Mug",
        link: "https://shop.glacier.org/products/bear-mug",
        description: "Camp mug featuring the park's grizzly safety messaging.",
    },
];

pub struct ProductOfTheDayModule;

impl DigestModule for ProductOfTheDayModule {
    fn name(&self) -> &'static str {
        "product"
    }

    fn field_keys(&self) -> &'static [&'static str] {
        &["product_title", "product_link", "product_desc"]
    }

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::Primary
    }

    fn fetch(&self) -> Result<ModuleOutput, FetchError> {
        Ok(output_for(&today_string()))
    }
}

fn output_for(date: &str) -> ModuleOutput {
    let product = &PRODUCTS[pick_index(date, "product", PRODUCTS.len())];
    ModuleOutput::new()
        .with_field("product_title", product.title)
        .with_field("product_link", product.link)
        .with_field("product_desc", product.description)
}
