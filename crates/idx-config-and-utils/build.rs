fn main() {
    // Tell cargo to recompile when these compile-time env vars change.
    // Without this, option_env!() values get cached and won't update.
    println!("cargo:rerun-if-env-changed=IDX_ISSUER");
    println!("cargo:rerun-if-env-changed=IDX_CLIENT_ID");
    println!("cargo:rerun-if-env-changed=IDX_REDIRECT_URI");
}
