// build.rs

fn main() {
    // Generate build info (VERGEN_BUILD_*, VERGEN_GIT_*) for --version output
    vergen::EmitBuilder::builder()
        .all_build()
        .all_git()
        .emit()
        .expect("Unable to generate build info");
}
