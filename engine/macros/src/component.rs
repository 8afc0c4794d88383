use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let struct_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    // Use ::rusty_ecs::component::Component which works both inside and outside the crate.
    // Inside the crate, this works because of `extern crate self as rusty_ecs;` in lib.rs
    // Outside the crate, this naturally resolves to the rusty_ecs dependency.
    TokenStream::from(quote! {
        impl #impl_generics ::rusty_ecs::component::Component for #struct_name #ty_generics #where_clause {
        }
    })
}
