//! Generates the Swift and Kotlin bindings for `SessionKit`.

fn main() {
    uniffi::uniffi_bindgen_main();
}
