//! Startup banner. Purely cosmetic, printed once before the engine opens any
//! connection; carries no coupling to the engine itself.

const BANNER: &str = r#"
 _     _           _
| |__ | | __ _ ___| |_
| '_ \| |/ _` / __| __|
| |_) | | (_| \__ \ |_
|_.__/|_|\__,_|___/\__|

a load generator for persistent TCP servers
"#;

pub fn print() {
    println!("{BANNER}");
}
