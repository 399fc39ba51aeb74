mod test_liquidity {
    use cosmwasm_std::{Addr, Uint128, Uint64};
    use fixed_point_math::{I256, U256};
    use test_helpers::{
        asset::{fund_and_approve, query_balance},
        definitions::{CHAIN_INTERFACE, CHANNEL_ID, DEFAULT_TEST_GOV_FEE, DEFAULT_TEST_VAULT_FEE, DEPOSITOR, SWAPPER_A},
        math::{
            amplified_liquidity_share, amplified_liquidity_units, f64_to_u256, u256_to_f64, uint128_to_f64,
            uint64_to_f64, volatile_liquidity_share, volatile_liquidity_units, volatile_reference_amount,
            volatile_units
        },
        misc::get_response_attribute
    };

    use crate::{
        error::ContractError,
        escrow::{EscrowState, PacketId},
        tests::{
            helpers::{
                mock_block, mock_deploy_vault, mock_liquidity_ack_msg, mock_receive_liquidity_msg,
                mock_send_liquidity, remote_account, remote_vault, TestVault, VAULT_ADDR
            },
            parameters::{
                AMPLIFICATION, TEST_VAULT_ASSETS, TEST_VAULT_ASSET_COUNT, TEST_VAULT_BALANCES,
                TEST_VAULT_WEIGHTS, VOLATILE_AMPLIFICATION
            }
        },
        vault_token::INITIAL_MINT_AMOUNT
    };

    // Sum of the test vault weights
    const TEST_VAULT_WEIGHTS_SUM: f64 = 1100.;

    // w·b of every test vault asset
    const TEST_VAULT_WEIGHTED_BALANCE: f64 = 6e25;


    fn fund_deposit(vault: &TestVault, account: &str, deposit_amounts: &[Uint128]) {
        for (asset, amount) in TEST_VAULT_ASSETS.iter().zip(deposit_amounts) {
            fund_and_approve(vault.ledger(), asset, account, vault.address(), *amount);
        }
    }

    fn balanced_deposit(percentage: u64) -> Vec<Uint128> {
        TEST_VAULT_BALANCES.iter()
            .map(|balance| *balance * Uint128::from(percentage) / Uint128::from(100u64))
            .collect()
    }



    // Deposits ***********************************************************************************************************

    #[test]
    fn test_deposit_mixed_balanced() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, Uint64::zero(), Uint64::zero());

        // Deposit 10% of every asset
        let deposit_amounts = balanced_deposit(10);
        fund_deposit(&vault, SWAPPER_A, &deposit_amounts);



        // Tested action: deposit
        let response = vault.deposit_mixed(
            &Addr::unchecked(SWAPPER_A),
            deposit_amounts.clone(),
            Uint128::zero()
        ).unwrap();



        // A balanced deposit buys the same share of the vault
        let minted = response.data;
        let expected_minted = uint128_to_f64(INITIAL_MINT_AMOUNT) * 0.1;
        assert!(uint128_to_f64(minted) <= expected_minted * 1.000001);
        assert!(uint128_to_f64(minted) >= expected_minted * 0.999999);

        assert_eq!(vault.vault_token_balance(&Addr::unchecked(SWAPPER_A)), minted);
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT + minted);

        // Verify the assets have been pulled
        let ledger = vault.ledger().as_ref();
        for ((asset, balance), amount) in TEST_VAULT_ASSETS.iter().zip(TEST_VAULT_BALANCES).zip(&deposit_amounts) {
            assert_eq!(query_balance(ledger, asset, VAULT_ADDR), balance + amount);
            assert_eq!(query_balance(ledger, asset, SWAPPER_A), Uint128::zero());
        }

        let event = response.events[0].clone();
        assert_eq!(event.ty, "deposit");
        assert_eq!(get_response_attribute::<Uint128>(&event, "mint").unwrap(), minted);
    }


    #[test]
    fn test_deposit_mixed_single_asset_with_fee() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);

        // Deposit 10% of the first asset only
        let deposit_amounts = vec![TEST_VAULT_BALANCES[0] / Uint128::from(10u64), Uint128::zero(), Uint128::zero()];
        fund_deposit(&vault, SWAPPER_A, &deposit_amounts);



        // Tested action: deposit
        let minted = vault.deposit_mixed(
            &Addr::unchecked(SWAPPER_A),
            deposit_amounts,
            Uint128::zero()
        ).unwrap().data;



        // units = w_0·ln(1.1)·(1 - fee)
        let fee = uint64_to_f64(DEFAULT_TEST_VAULT_FEE) / 1e18;
        let units = volatile_units(0.1, 1., 600.) * (1. - fee);
        let expected_minted = uint128_to_f64(INITIAL_MINT_AMOUNT) * volatile_liquidity_share(units, TEST_VAULT_WEIGHTS_SUM);

        assert!(uint128_to_f64(minted) <= expected_minted * 1.000001);
        assert!(uint128_to_f64(minted) >= expected_minted * 0.999999);

        // No governance fee is taken on deposits
        assert_eq!(
            query_balance(vault.ledger().as_ref(), TEST_VAULT_ASSETS[0], VAULT_ADDR),
            TEST_VAULT_BALANCES[0] + TEST_VAULT_BALANCES[0] / Uint128::from(10u64)
        );
    }


    #[test]
    fn test_deposit_mixed_min_out() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, Uint64::zero(), Uint64::zero());

        let deposit_amounts = balanced_deposit(10);
        fund_deposit(&vault, SWAPPER_A, &deposit_amounts);

        // The deposit is worth ~10% of the supply
        let min_out = INITIAL_MINT_AMOUNT / Uint128::from(5u64);



        // Tested action: deposit with an unreachable min_out
        let response_result = vault.deposit_mixed(&Addr::unchecked(SWAPPER_A), deposit_amounts.clone(), min_out);



        assert!(matches!(
            response_result,
            Err(ContractError::InsufficientReturn { min_out: err_min_out, .. }) if err_min_out == min_out
        ));

        // Make sure nothing has changed
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT);
        assert_eq!(query_balance(vault.ledger().as_ref(), TEST_VAULT_ASSETS[0], SWAPPER_A), deposit_amounts[0]);
    }


    #[test]
    fn test_deposit_mixed_without_allowance() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, Uint64::zero(), Uint64::zero());

        // Only fund and approve the first two assets
        let deposit_amounts = balanced_deposit(10);
        fund_deposit(&vault, SWAPPER_A, &deposit_amounts[..2]);



        // Tested action: deposit without allowance for the last asset
        let response_result = vault.deposit_mixed(&Addr::unchecked(SWAPPER_A), deposit_amounts.clone(), Uint128::zero());



        assert!(response_result.is_err());

        // The minted vault tokens have been reverted, and no asset has been pulled
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT);
        assert_eq!(vault.vault_token_balance(&Addr::unchecked(SWAPPER_A)), Uint128::zero());
        assert_eq!(query_balance(vault.ledger().as_ref(), TEST_VAULT_ASSETS[0], SWAPPER_A), deposit_amounts[0]);
        assert_eq!(query_balance(vault.ledger().as_ref(), TEST_VAULT_ASSETS[0], VAULT_ADDR), TEST_VAULT_BALANCES[0]);
    }


    #[test]
    fn test_deposit_mixed_invalid_parameters() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, Uint64::zero(), Uint64::zero());
        let sender = Addr::unchecked(SWAPPER_A);



        // Tested action: invalid deposit_amounts count
        let response_result = vault.deposit_mixed(&sender, vec![Uint128::one()], Uint128::zero());
        assert!(matches!(response_result, Err(ContractError::InvalidParameters { .. })));

        // Tested action: empty deposit
        let response_result = vault.deposit_mixed(&sender, vec![Uint128::zero(); TEST_VAULT_ASSET_COUNT], Uint128::zero());
        assert!(matches!(response_result, Err(ContractError::InvalidParameters { .. })));
    }


    #[test]
    fn test_deposit_mixed_amplified_security_limit() {

        let (vault, _interface) = mock_deploy_vault(AMPLIFICATION, Uint64::zero(), Uint64::zero());
        let block = mock_block(12, 0);

        let deposit_amounts = balanced_deposit(10);
        fund_deposit(&vault, SWAPPER_A, &deposit_amounts);

        let limit_before = vault.limit_capacity(block.time).unwrap();



        // Tested action: deposit
        let minted = vault.deposit_mixed(&Addr::unchecked(SWAPPER_A), deposit_amounts, Uint128::zero())
            .unwrap()
            .data;



        let expected_minted = uint128_to_f64(INITIAL_MINT_AMOUNT) * 0.1;
        assert!(uint128_to_f64(minted) <= expected_minted * 1.000001);
        assert!(uint128_to_f64(minted) >= expected_minted * 0.999999);

        // Both the max and the used capacity grow by the weighted deposit
        let weighted_deposit = U256::from(3u64) * f64_to_u256(TEST_VAULT_WEIGHTED_BALANCE / 10.).unwrap();
        let limit_after = vault.limit_capacity(block.time).unwrap();
        assert_eq!(limit_after.max_limit_capacity, limit_before.max_limit_capacity + weighted_deposit);
        assert_eq!(limit_after.used_limit_capacity, limit_before.used_limit_capacity + weighted_deposit);
        assert_eq!(limit_after.capacity, limit_before.capacity);
    }



    // Withdrawals ********************************************************************************************************

    #[test]
    fn test_withdraw_all() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, Uint64::zero(), Uint64::zero());
        let withdraw_amount = INITIAL_MINT_AMOUNT / Uint128::from(10u64);



        // Tested action: withdraw 10% of the vault tokens
        let response = vault.withdraw_all(
            &Addr::unchecked(DEPOSITOR),
            withdraw_amount,
            vec![Uint128::zero(); TEST_VAULT_ASSET_COUNT]
        ).unwrap();



        // The withdrawal is proportional to the balances
        let expected_amounts: Vec<Uint128> = balanced_deposit(10);
        assert_eq!(response.data, expected_amounts);

        let ledger = vault.ledger().as_ref();
        for ((asset, balance), amount) in TEST_VAULT_ASSETS.iter().zip(TEST_VAULT_BALANCES).zip(&expected_amounts) {
            assert_eq!(query_balance(ledger, asset, DEPOSITOR), *amount);
            assert_eq!(query_balance(ledger, asset, VAULT_ADDR), balance - amount);
        }

        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT - withdraw_amount);
        assert_eq!(vault.vault_token_balance(&Addr::unchecked(DEPOSITOR)), INITIAL_MINT_AMOUNT - withdraw_amount);

        let event = response.events[0].clone();
        assert_eq!(event.ty, "withdraw");
        assert_eq!(get_response_attribute::<Uint128>(&event, "burn").unwrap(), withdraw_amount);
    }


    #[test]
    fn test_withdraw_all_entire_vault() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, Uint64::zero(), Uint64::zero());



        // Tested action: withdraw every vault token
        let withdraw_amounts = vault.withdraw_all(
            &Addr::unchecked(DEPOSITOR),
            INITIAL_MINT_AMOUNT,
            vec![Uint128::zero(); TEST_VAULT_ASSET_COUNT]
        ).unwrap().data;



        assert_eq!(withdraw_amounts, TEST_VAULT_BALANCES.to_vec());
        assert_eq!(vault.total_supply(), Uint128::zero());
        for asset in TEST_VAULT_ASSETS {
            assert_eq!(query_balance(vault.ledger().as_ref(), asset, VAULT_ADDR), Uint128::zero());
        }
    }


    #[test]
    fn test_withdraw_all_min_out() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, Uint64::zero(), Uint64::zero());
        let withdraw_amount = INITIAL_MINT_AMOUNT / Uint128::from(10u64);

        let mut min_out = balanced_deposit(10);
        min_out[1] += Uint128::one();



        // Tested action: withdraw with an unreachable min_out
        let response_result = vault.withdraw_all(&Addr::unchecked(DEPOSITOR), withdraw_amount, min_out.clone());



        assert_eq!(
            response_result,
            Err(ContractError::InsufficientReturn { out: min_out[1] - Uint128::one(), min_out: min_out[1] })
        );

        // Make sure no vault tokens have been burnt
        assert_eq!(vault.vault_token_balance(&Addr::unchecked(DEPOSITOR)), INITIAL_MINT_AMOUNT);
        assert_eq!(query_balance(vault.ledger().as_ref(), TEST_VAULT_ASSETS[1], DEPOSITOR), Uint128::zero());
    }


    #[test]
    fn test_withdraw_all_insufficient_vault_tokens() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, Uint64::zero(), Uint64::zero());



        // Tested action: withdraw without vault tokens
        let response_result = vault.withdraw_all(
            &Addr::unchecked(SWAPPER_A),
            Uint128::new(1000),
            vec![Uint128::zero(); TEST_VAULT_ASSET_COUNT]
        );



        assert!(matches!(response_result, Err(ContractError::InsufficientBalance { .. })));
        assert_eq!(query_balance(vault.ledger().as_ref(), TEST_VAULT_ASSETS[0], SWAPPER_A), Uint128::zero());
    }


    #[test]
    fn test_deposit_and_withdraw() {

        for amplification in [VOLATILE_AMPLIFICATION, AMPLIFICATION] {

            let (vault, _interface) = mock_deploy_vault(amplification, Uint64::zero(), Uint64::zero());

            let deposit_amounts = balanced_deposit(10);
            fund_deposit(&vault, SWAPPER_A, &deposit_amounts);

            let minted = vault.deposit_mixed(&Addr::unchecked(SWAPPER_A), deposit_amounts.clone(), Uint128::zero())
                .unwrap()
                .data;



            // Tested action: withdraw the deposit
            let withdraw_amounts = vault.withdraw_all(
                &Addr::unchecked(SWAPPER_A),
                minted,
                vec![Uint128::zero(); TEST_VAULT_ASSET_COUNT]
            ).unwrap().data;



            // The depositor gets back what was deposited
            for (withdrawn, deposited) in withdraw_amounts.iter().zip(&deposit_amounts) {
                assert!(uint128_to_f64(*withdrawn) <= uint128_to_f64(*deposited) * 1.000001);
                assert!(uint128_to_f64(*withdrawn) >= uint128_to_f64(*deposited) * 0.99999);
            }
        }
    }



    // Send liquidity *****************************************************************************************************

    #[test]
    fn test_send_liquidity_escrow() {

        let (vault, interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);
        let amount = INITIAL_MINT_AMOUNT / Uint128::from(10u64);



        // Tested action: send liquidity
        let response = mock_send_liquidity(&vault, &interface, DEPOSITOR, amount, &block).unwrap();



        let send_response = response.data.clone();
        assert_eq!(send_response.packet_id, PacketId::new(CHANNEL_ID, 1));

        // Verify the units
        let expected_units = volatile_liquidity_units(
            uint128_to_f64(amount),
            uint128_to_f64(INITIAL_MINT_AMOUNT),
            TEST_VAULT_WEIGHTS_SUM
        );
        assert!(u256_to_f64(send_response.units) <= expected_units * 1.000001);
        assert!(u256_to_f64(send_response.units) >= expected_units * 0.999999);

        // The vault tokens are burnt and held in escrow
        assert_eq!(vault.vault_token_balance(&Addr::unchecked(DEPOSITOR)), INITIAL_MINT_AMOUNT - amount);
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT - amount);
        assert_eq!(vault.total_escrowed_liquidity(), amount);

        let escrow = vault.liquidity_escrow(&send_response.packet_id).unwrap();
        assert_eq!(escrow.state, EscrowState::Open);
        assert_eq!(escrow.amount, amount);
        assert_eq!(escrow.fallback_account, Addr::unchecked(DEPOSITOR));
        assert_eq!(escrow.block_height, 12);

        // Verify the packet handed to the chain interface
        let sent = interface.sent_liquidity();
        assert_eq!(sent.len(), 1);
        let (packet_id, packet) = &sent[0];
        assert_eq!(packet_id, &send_response.packet_id);
        assert_eq!(packet.to_vault, remote_vault());
        assert_eq!(packet.to_account, remote_account(DEPOSITOR));
        assert_eq!(packet.u, send_response.units);
        assert_eq!(packet.from_amount, amount);
        assert_eq!(packet.block_number, 12);
        assert!(interface.sent().is_empty());

        let event = response.events[0].clone();
        assert_eq!(event.ty, "send-liquidity");
        assert_eq!(get_response_attribute::<U256>(&event, "units").unwrap(), send_response.units);
    }


    #[test]
    fn test_send_liquidity_success() {

        let (vault, interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);
        let amount = INITIAL_MINT_AMOUNT / Uint128::from(10u64);

        let send_response = mock_send_liquidity(&vault, &interface, DEPOSITOR, amount, &block).unwrap().data;
        let ack = mock_liquidity_ack_msg(&send_response, DEPOSITOR, amount, &block);



        // Tested action: send liquidity success
        let response = vault.on_send_liquidity_success(&Addr::unchecked(CHAIN_INTERFACE), ack.clone()).unwrap();



        // The vault tokens stay burnt
        assert_eq!(vault.liquidity_escrow(&send_response.packet_id).unwrap().state, EscrowState::Released);
        assert_eq!(vault.total_escrowed_liquidity(), Uint128::zero());
        assert_eq!(vault.vault_token_balance(&Addr::unchecked(DEPOSITOR)), INITIAL_MINT_AMOUNT - amount);
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT - amount);
        assert_eq!(response.events[0].ty, "send-liquidity-success");



        // Tested action: repeated success and late failure
        let repeated_success = vault.on_send_liquidity_success(&Addr::unchecked(CHAIN_INTERFACE), ack.clone());
        let late_failure = vault.on_send_liquidity_failure(&Addr::unchecked(CHAIN_INTERFACE), ack);



        assert_eq!(
            repeated_success,
            Err(ContractError::UnknownOrResolvedPacket { packet_id: send_response.packet_id.clone() })
        );
        assert_eq!(
            late_failure,
            Err(ContractError::UnknownOrResolvedPacket { packet_id: send_response.packet_id })
        );
        assert_eq!(vault.vault_token_balance(&Addr::unchecked(DEPOSITOR)), INITIAL_MINT_AMOUNT - amount);
    }


    #[test]
    fn test_send_liquidity_failure() {

        let (vault, interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);
        let amount = INITIAL_MINT_AMOUNT / Uint128::from(10u64);

        let send_response = mock_send_liquidity(&vault, &interface, DEPOSITOR, amount, &block).unwrap().data;
        let ack = mock_liquidity_ack_msg(&send_response, DEPOSITOR, amount, &block);



        // Tested action: send liquidity failure (e.g. timeout)
        let response = vault.on_send_liquidity_failure(&Addr::unchecked(CHAIN_INTERFACE), ack.clone()).unwrap();



        // The vault tokens are minted back to the fallback account
        assert_eq!(vault.liquidity_escrow(&send_response.packet_id).unwrap().state, EscrowState::Refunded);
        assert_eq!(vault.total_escrowed_liquidity(), Uint128::zero());
        assert_eq!(vault.vault_token_balance(&Addr::unchecked(DEPOSITOR)), INITIAL_MINT_AMOUNT);
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT);
        assert_eq!(response.events[0].ty, "send-liquidity-failure");



        // Tested action: repeated failure
        let repeated_failure = vault.on_send_liquidity_failure(&Addr::unchecked(CHAIN_INTERFACE), ack);



        assert_eq!(
            repeated_failure,
            Err(ContractError::UnknownOrResolvedPacket { packet_id: send_response.packet_id })
        );

        // Make sure the refund has not been minted twice
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT);
    }


    #[test]
    fn test_send_liquidity_ack_mismatch() {

        let (vault, interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);
        let amount = INITIAL_MINT_AMOUNT / Uint128::from(10u64);

        let send_response = mock_send_liquidity(&vault, &interface, DEPOSITOR, amount, &block).unwrap().data;

        let mut ack = mock_liquidity_ack_msg(&send_response, DEPOSITOR, amount, &block);
        ack.escrow_amount = amount + Uint128::one();



        // Tested action: refund a larger amount than escrowed
        let response_result = vault.on_send_liquidity_failure(&Addr::unchecked(CHAIN_INTERFACE), ack);



        assert_eq!(
            response_result,
            Err(ContractError::EscrowMismatch { packet_id: send_response.packet_id.clone() })
        );
        assert_eq!(vault.liquidity_escrow(&send_response.packet_id).unwrap().state, EscrowState::Open);
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT - amount);
    }


    #[test]
    fn test_send_liquidity_interface_failure() {

        let (vault, interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let amount = INITIAL_MINT_AMOUNT / Uint128::from(10u64);

        interface.set_failing(true);



        // Tested action: send liquidity with a failing chain interface
        let response_result = mock_send_liquidity(&vault, &interface, DEPOSITOR, amount, &mock_block(12, 1000));



        assert!(matches!(response_result, Err(ContractError::ChainInterface { .. })));

        // Make sure nothing has changed
        assert_eq!(vault.vault_token_balance(&Addr::unchecked(DEPOSITOR)), INITIAL_MINT_AMOUNT);
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT);
        assert_eq!(vault.total_escrowed_liquidity(), Uint128::zero());
        assert!(vault.liquidity_escrow(&PacketId::new(CHANNEL_ID, 1)).is_none());
        assert!(interface.sent_liquidity().is_empty());
    }


    #[test]
    fn test_send_liquidity_insufficient_vault_tokens() {

        let (vault, interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);



        // Tested action: send liquidity without vault tokens
        let response_result = mock_send_liquidity(&vault, &interface, SWAPPER_A, Uint128::new(1000), &block);



        assert!(matches!(response_result, Err(ContractError::InsufficientBalance { .. })));
        assert!(vault.liquidity_escrow(&PacketId::new(CHANNEL_ID, 1)).is_none());
        assert_eq!(vault.total_escrowed_liquidity(), Uint128::zero());

        // The packet id is still available
        let response = mock_send_liquidity(&vault, &interface, DEPOSITOR, Uint128::new(1000), &block).unwrap();
        assert_eq!(response.data.packet_id, PacketId::new(CHANNEL_ID, 1));
    }


    #[test]
    fn test_send_liquidity_amplified_unit_tracker() {

        let (vault, interface) = mock_deploy_vault(AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);
        let amount = INITIAL_MINT_AMOUNT / Uint128::from(10u64);



        // Tested action: send liquidity
        let send_response = mock_send_liquidity(&vault, &interface, DEPOSITOR, amount, &block).unwrap().data;



        let expected_units = amplified_liquidity_units(
            uint128_to_f64(amount),
            uint128_to_f64(INITIAL_MINT_AMOUNT),
            TEST_VAULT_WEIGHTED_BALANCE,
            TEST_VAULT_ASSET_COUNT as f64,
            0.9
        );
        assert!(u256_to_f64(send_response.units) <= expected_units * 1.000001);
        assert!(u256_to_f64(send_response.units) >= expected_units * 0.999999);

        assert_eq!(vault.unit_tracker(), I256::try_from(send_response.units).unwrap());



        // Tested action: send liquidity failure
        vault.on_send_liquidity_failure(
            &Addr::unchecked(CHAIN_INTERFACE),
            mock_liquidity_ack_msg(&send_response, DEPOSITOR, amount, &block)
        ).unwrap();



        assert_eq!(vault.unit_tracker(), I256::ZERO);
    }



    // Receive liquidity **************************************************************************************************

    #[test]
    fn test_receive_liquidity() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);

        // The units of 10% of the vault tokens of an equal vault
        let units = f64_to_u256(volatile_liquidity_units(0.1, 1., TEST_VAULT_WEIGHTS_SUM)).unwrap();



        // Tested action: receive liquidity
        let response = vault.receive_liquidity(
            &Addr::unchecked(CHAIN_INTERFACE),
            &block,
            mock_receive_liquidity_msg(SWAPPER_A, units, Uint128::zero(), Uint128::zero())
        ).unwrap();



        // The recipient owns 10% of the vault after the mint
        let minted = response.data;
        let expected_minted = uint128_to_f64(INITIAL_MINT_AMOUNT) * (1. / 0.9 - 1.);
        assert!(uint128_to_f64(minted) <= expected_minted * 1.000001);
        assert!(uint128_to_f64(minted) >= expected_minted * 0.999999);

        assert_eq!(vault.vault_token_balance(&Addr::unchecked(SWAPPER_A)), minted);
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT + minted);

        // The units are charged to the security limit
        assert_eq!(vault.limit_capacity(block.time).unwrap().used_limit_capacity, units);

        let event = response.events[0].clone();
        assert_eq!(event.ty, "receive-liquidity");
        assert_eq!(get_response_attribute::<Uint128>(&event, "to_amount").unwrap(), minted);
    }


    #[test]
    fn test_receive_liquidity_min_vault_tokens() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);
        let units = f64_to_u256(volatile_liquidity_units(0.1, 1., TEST_VAULT_WEIGHTS_SUM)).unwrap();
        let min_vault_tokens = INITIAL_MINT_AMOUNT / Uint128::from(5u64);



        // Tested action: receive liquidity with an unreachable min_vault_tokens
        let response_result = vault.receive_liquidity(
            &Addr::unchecked(CHAIN_INTERFACE),
            &block,
            mock_receive_liquidity_msg(SWAPPER_A, units, min_vault_tokens, Uint128::zero())
        );



        assert!(matches!(
            response_result,
            Err(ContractError::InsufficientReturn { min_out, .. }) if min_out == min_vault_tokens
        ));

        // Make sure nothing has changed
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT);
        assert_eq!(vault.limit_capacity(block.time).unwrap().used_limit_capacity, U256::ZERO);
    }


    #[test]
    fn test_receive_liquidity_min_reference_asset() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);
        let units = f64_to_u256(volatile_liquidity_units(0.1, 1., TEST_VAULT_WEIGHTS_SUM)).unwrap();

        // The recipient owns 10% of the vault after the mint
        let balances: Vec<f64> = TEST_VAULT_BALANCES.iter().map(|balance| uint128_to_f64(*balance)).collect();
        let weights: Vec<f64> = TEST_VAULT_WEIGHTS.iter().map(|weight| weight.u64() as f64).collect();
        let expected_reference = volatile_reference_amount(&balances, &weights) * 0.1;



        // Tested action: receive liquidity with an unreachable reference amount
        let response_result = vault.receive_liquidity(
            &Addr::unchecked(CHAIN_INTERFACE),
            &block,
            mock_receive_liquidity_msg(
                SWAPPER_A,
                units,
                Uint128::zero(),
                Uint128::new((expected_reference * 1.001) as u128)
            )
        );



        assert!(matches!(response_result, Err(ContractError::InsufficientReturn { .. })));
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT);



        // Tested action: receive liquidity with a reachable reference amount
        let minted = vault.receive_liquidity(
            &Addr::unchecked(CHAIN_INTERFACE),
            &block,
            mock_receive_liquidity_msg(
                SWAPPER_A,
                units,
                Uint128::zero(),
                Uint128::new((expected_reference * 0.999) as u128)
            )
        ).unwrap().data;



        assert_eq!(vault.vault_token_balance(&Addr::unchecked(SWAPPER_A)), minted);
    }


    #[test]
    fn test_receive_liquidity_security_limit() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);

        // The units of 50% of the vault tokens of an equal vault exceed ln(2)·w_sum
        let units = f64_to_u256(volatile_liquidity_units(0.51, 1., TEST_VAULT_WEIGHTS_SUM)).unwrap();



        // Tested action: receive liquidity beyond the security limit
        let response_result = vault.receive_liquidity(
            &Addr::unchecked(CHAIN_INTERFACE),
            &block,
            mock_receive_liquidity_msg(SWAPPER_A, units, Uint128::zero(), Uint128::zero())
        );



        assert!(matches!(response_result, Err(ContractError::SecurityLimitExceeded { .. })));
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT);
    }


    #[test]
    fn test_receive_liquidity_unauthorized() {

        let (vault, _interface) = mock_deploy_vault(VOLATILE_AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);



        // Tested action: receive liquidity from an account other than the chain interface
        let response_result = vault.receive_liquidity(
            &Addr::unchecked(SWAPPER_A),
            &mock_block(12, 1000),
            mock_receive_liquidity_msg(SWAPPER_A, U256::from(1000u64), Uint128::zero(), Uint128::zero())
        );



        assert_eq!(response_result, Err(ContractError::Unauthorized {}));
    }


    #[test]
    fn test_receive_liquidity_amplified() {

        let (vault, _interface) = mock_deploy_vault(AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);
        let block = mock_block(12, 1000);
        let asset_count = TEST_VAULT_ASSET_COUNT as f64;

        // The units of 10% of the vault tokens of an equal vault
        let units = f64_to_u256(
            amplified_liquidity_units(0.1, 1., TEST_VAULT_WEIGHTED_BALANCE, asset_count, 0.9)
        ).unwrap();

        let limit_before = vault.limit_capacity(block.time).unwrap();



        // Tested action: receive liquidity
        let minted = vault.receive_liquidity(
            &Addr::unchecked(CHAIN_INTERFACE),
            &block,
            mock_receive_liquidity_msg(SWAPPER_A, units, Uint128::zero(), Uint128::zero())
        ).unwrap().data;



        let expected_share = amplified_liquidity_share(
            u256_to_f64(units),
            TEST_VAULT_WEIGHTED_BALANCE,
            asset_count,
            0.9
        );
        let expected_minted = uint128_to_f64(INITIAL_MINT_AMOUNT) * expected_share;
        assert!(uint128_to_f64(minted) <= expected_minted * 1.000001);
        assert!(uint128_to_f64(minted) >= expected_minted * 0.999999);

        // The received units are removed from the unit tracker
        assert_eq!(vault.unit_tracker(), -I256::try_from(units).unwrap());

        // The units of a 10% withdrawal are worth 10% of the weighted balances, charged twice
        let expected_charge = 2. * asset_count * TEST_VAULT_WEIGHTED_BALANCE * 0.1;
        let used = u256_to_f64(vault.limit_capacity(block.time).unwrap().used_limit_capacity - limit_before.used_limit_capacity);
        assert!(used <= expected_charge * 1.00001);
        assert!(used >= expected_charge * 0.99999);
    }


    #[test]
    fn test_receive_liquidity_amplified_too_many_units() {

        let (vault, _interface) = mock_deploy_vault(AMPLIFICATION, DEFAULT_TEST_VAULT_FEE, DEFAULT_TEST_GOV_FEE);

        // n·(w·a_0)^(1-k) is ~1058 (in WAD notation)
        let units = U256::from(2000u64) * fixed_point_math::WAD;



        // Tested action: receive liquidity worth more than the vault
        let response_result = vault.receive_liquidity(
            &Addr::unchecked(CHAIN_INTERFACE),
            &mock_block(12, 1000),
            mock_receive_liquidity_msg(SWAPPER_A, units, Uint128::zero(), Uint128::zero())
        );



        assert!(matches!(response_result, Err(ContractError::SecurityLimitExceeded { .. })));
        assert_eq!(vault.total_supply(), INITIAL_MINT_AMOUNT);
        assert_eq!(vault.unit_tracker(), I256::ZERO);
    }
}
