fn main() {
    protobuf_codegen::Codegen::new()
        .pure()
        .includes(["resources"])
        .input("resources/phonemetadata.proto")
        .input("resources/phonenumber.proto")
        .cargo_out_dir("proto_gen")
        .run_from_script();

    println!("cargo:rerun-if-changed=resources/phonemetadata.proto");
    println!("cargo:rerun-if-changed=resources/phonenumber.proto");
}
