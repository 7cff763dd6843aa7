use spine_kernel::catalog::listing_json;

use crate::support::{bootstrap_or_exit, print_json};

pub fn run(json_output: bool) {
    let catalog = bootstrap_or_exit();

    if json_output {
        print_json(&listing_json(&catalog));
        return;
    }

    for listing in catalog.listing() {
        println!("{} ({})", listing.registry, listing.names.len());
        for name in &listing.names {
            println!("  {name}");
        }
    }
}
