//! Environment-variable defaults for flags that accept one: `-d`/
//! `DNS_SUFFIX`, `-h`/`HOSTNAME`, `-profile`/`PROFILE`,
//! `-amtPassword`/`AMT_PASSWORD`.

pub fn dns_suffix() -> Option<String> {
    std::env::var("DNS_SUFFIX").ok()
}

pub fn hostname() -> Option<String> {
    std::env::var("HOSTNAME").ok()
}

pub fn profile() -> Option<String> {
    std::env::var("PROFILE").ok()
}

pub fn amt_password() -> Option<String> {
    std::env::var("AMT_PASSWORD").ok()
}
