//! Symbols command implementation

use super::Context;
use crate::asset::Asset;
use clap::Args;

#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// Crawl Finnhub again even if the cache file exists
    #[arg(long)]
    pub regenerate: bool,

    /// Resolve a cached symbol id to its asset, or an asset to its symbol id
    #[arg(long)]
    pub lookup: Option<String>,
}

impl SymbolsArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let api_key = ctx.api_key()?;
        let rest = ctx.rest_client(&api_key);
        let ids = ctx.symbol_ids(&rest, self.regenerate).await;

        println!(
            "{} symbol ids in {}",
            ids.len(),
            ctx.paths.symbol_ids_file().display()
        );

        if let Some(lookup) = &self.lookup {
            if ids.is_cached(lookup) {
                println!("{} -> {}", lookup, ids.find_asset(lookup));
            } else {
                let asset: Asset = lookup.parse()?;
                println!("{} -> {}", asset, ids.find_symbol_id(&asset));
            }
        }
        Ok(())
    }
}
