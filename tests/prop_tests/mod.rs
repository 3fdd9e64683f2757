mod crypto;
mod decision;
mod protocol;
